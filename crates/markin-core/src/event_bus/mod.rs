//! In-process publish/subscribe for editor events.
//!
//! Subscribers filter by category or by wire topic (`"select"`, `"dragend"`,
//! ...). Async hosts can poll a broadcast receiver instead of registering
//! handlers.
//!
//! ## Usage
//!
//! ```rust
//! use markin_core::event_bus::{AnnotatorEvent, EventBus, EventFilter, SettingsEvent};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(EventFilter::topic("zoomchange"), |event| {
//!     if let AnnotatorEvent::Settings(SettingsEvent::ZoomChanged { zoom }) = event {
//!         println!("zoom is now {}", zoom);
//!     }
//! });
//!
//! let heard = bus.publish(AnnotatorEvent::Settings(SettingsEvent::ZoomChanged { zoom: 2.0 }));
//! assert_eq!(heard, 1);
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
