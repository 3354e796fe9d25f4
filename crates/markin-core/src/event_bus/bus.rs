//! The per-annotator event bus.
//!
//! Handlers run on the publishing thread in subscription order. Async hosts
//! read the same stream from a broadcast receiver, and a bounded, numbered
//! history lets pollers pick up where they left off.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AnnotatorEvent, EventCategory};

/// Returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.0.simple().to_string();
        write!(f, "sub-{}", &id[..8])
    }
}

/// Which events a handler wants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventFilter {
    #[default]
    All,
    Categories(Vec<EventCategory>),
    /// Wire topic names such as `"select"` or `"dragend"`.
    Topics(Vec<String>),
}

impl EventFilter {
    pub fn topic(name: impl Into<String>) -> Self {
        EventFilter::Topics(vec![name.into()])
    }

    pub fn matches(&self, event: &AnnotatorEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
            EventFilter::Topics(topics) => topics.iter().any(|t| t == event.topic()),
        }
    }
}

type Handler = Box<dyn Fn(AnnotatorEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Handler,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventBusConfig {
    /// Buffer of the broadcast channel; slow receivers lag past this.
    pub channel_capacity: usize,
    /// Events kept for [`EventBus::history_since`]; 0 keeps none.
    pub history_limit: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_limit: 0,
        }
    }
}

pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    sender: broadcast::Sender<AnnotatorEvent>,
    history: RwLock<VecDeque<(u64, AnnotatorEvent)>>,
    sequence: AtomicU64,
    config: EventBusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            subscribers: RwLock::new(Vec::new()),
            sender,
            history: RwLock::new(VecDeque::new()),
            sequence: AtomicU64::new(0),
            config,
        }
    }

    /// Delivers `event` to matching handlers and to every receiver.
    ///
    /// Returns how many handlers and receivers saw it. Zero is not an error:
    /// an editor with nobody listening keeps working.
    pub fn publish(&self, event: AnnotatorEvent) -> usize {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("#{} {}: {}", sequence, event.topic(), event.description());

        if self.config.history_limit > 0 {
            let mut history = self.history.write();
            history.push_back((sequence, event.clone()));
            while history.len() > self.config.history_limit {
                history.pop_front();
            }
        }

        let mut delivered = 0;
        for subscriber in self.subscribers.read().iter() {
            if subscriber.filter.matches(&event) {
                (subscriber.handler)(event.clone());
                delivered += 1;
            }
        }
        delivered + self.sender.send(event).unwrap_or(0)
    }

    /// [`publish`](Self::publish) for call sites that don't care who heard.
    pub fn emit(&self, event: AnnotatorEvent) {
        self.publish(event);
    }

    /// Registers `handler` for events matching `filter`.
    ///
    /// Handlers are called mid-operation, so they must not block and must
    /// not publish back into the same bus.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AnnotatorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            handler: Box::new(handler),
        });
        tracing::debug!("Subscription {} added", id);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// A receiver for hosts that consume events from a tokio task.
    pub fn receiver(&self) -> broadcast::Receiver<AnnotatorEvent> {
        self.sender.subscribe()
    }

    /// Sequence number of the most recent event, 0 before the first.
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Retained events numbered after `sequence`, oldest first.
    pub fn history_since(&self, sequence: u64) -> Vec<(u64, AnnotatorEvent)> {
        self.history
            .read()
            .iter()
            .filter(|(n, _)| *n > sequence)
            .cloned()
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("last_sequence", &self.last_sequence())
            .field("config", &self.config)
            .finish()
    }
}
