//! # Markin Core
//!
//! Core types and utilities for Markin.
//! Provides canvas geometry, the data types shared between the scene graph
//! and observers, error types, and the per-editor event bus.

pub mod constants;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod geometry;

pub use data::{
    Corner, ElementData, ElementInfo, HandleType, ModificationKind, NodeId, Role, ShapeKind,
};

pub use error::{ConfigError, Error, LookupError, Result};

pub use event_bus::{
    AnnotatorEvent, DragEvent, EventBus, EventBusConfig, EventCategory, EventFilter, HoverEvent,
    LifecycleEvent, ModificationData, ModificationEvent, SelectionEvent, SettingsEvent,
    SubscriptionId,
};

pub use geometry::{Bounds, Point};
