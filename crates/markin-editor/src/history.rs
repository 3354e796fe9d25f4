//! Undo/redo history over whole-scene snapshots.
//!
//! The top of the undo stack is always the current state, so `undo` needs at
//! least two entries. Saving clears the redo stack; the oldest entry is
//! evicted once the stack grows past capacity.

use chrono::{DateTime, Utc};

use markin_core::constants::DEFAULT_HISTORY_CAPACITY;

use crate::scene::Scene;

/// A labelled scene snapshot.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub label: String,
    pub timestamp: DateTime<Utc>,
    scene: Scene,
}

impl HistoryEntry {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_states: usize,
}

impl HistoryManager {
    /// Empty history holding at most `max_states` undo entries (minimum 1).
    pub fn new(max_states: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_states: max_states.max(1),
        }
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Pushes a snapshot of `scene` and clears the redo stack.
    pub fn save_state(&mut self, scene: &Scene, label: &str) {
        self.redo_stack.clear();
        self.undo_stack.push(HistoryEntry {
            label: label.to_string(),
            timestamp: Utc::now(),
            scene: scene.snapshot(),
        });
        if self.undo_stack.len() > self.max_states {
            self.undo_stack.remove(0);
        }
        tracing::debug!(
            "Saved state '{}' (undo depth {})",
            label,
            self.undo_stack.len()
        );
    }

    /// Steps back one entry and returns the scene to restore.
    ///
    /// Returns `None` when only the current state is left.
    pub fn undo(&mut self) -> Option<Scene> {
        if !self.can_undo() {
            tracing::debug!("Nothing to undo");
            return None;
        }
        let current = self.undo_stack.pop()?;
        tracing::debug!("Undo '{}'", current.label);
        self.redo_stack.push(current);
        self.undo_stack.last().map(|e| e.scene.clone())
    }

    /// Re-applies the most recently undone entry.
    pub fn redo(&mut self) -> Option<Scene> {
        let entry = self.redo_stack.pop()?;
        tracing::debug!("Redo '{}'", entry.label);
        let scene = entry.scene.clone();
        self.undo_stack.push(entry);
        Some(scene)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The entry describing the current state.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    /// Undo stack labels, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|e| e.label.as_str()).collect()
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
