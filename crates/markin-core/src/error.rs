//! Error handling for Markin
//!
//! Provides error types for the editor layers:
//! - Configuration errors (invalid zoom, options, rule payloads)
//! - Lookup errors (missing nodes, groups, selection)
//!
//! All error types use `thiserror` for ergonomic error handling. Nothing in
//! the editor is fatal: callers log and carry on with the prior state.

use thiserror::Error;

use crate::data::NodeId;

/// Configuration error type
///
/// Raised when an option or a persisted rule payload cannot be applied.
/// The operation is aborted and no state changes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Zoom must be a positive, finite number
    #[error("Invalid zoom level {zoom}: must be a positive number")]
    InvalidZoom {
        /// The rejected zoom value.
        zoom: f64,
    },

    /// History capacity must hold at least the initial state
    #[error("Invalid history capacity {max_states}: must be at least 1")]
    InvalidHistoryCapacity {
        /// The rejected capacity.
        max_states: usize,
    },

    /// Deletion rule payload could not be parsed
    #[error("Invalid deletion rules: {reason}")]
    InvalidDeletionRules {
        /// Parser message.
        reason: String,
    },

    /// An option value is out of range or inconsistent
    #[error("Invalid options: {reason}")]
    InvalidOptions {
        /// What was wrong.
        reason: String,
    },

    /// Options file has an extension we cannot read
    #[error("Unsupported options format: {path}")]
    UnsupportedFormat {
        /// The offending path.
        path: String,
    },
}

/// Lookup error type
///
/// Raised when an operation references something that is not in the scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// Node id does not resolve
    #[error("Node {node} not found")]
    NodeNotFound {
        /// The missing node.
        node: NodeId,
    },

    /// No annotation group matches the query
    #[error("No existing annotation found for {query}")]
    AnnotationNotFound {
        /// Human readable form of the lookup key.
        query: String,
    },

    /// The node is neither an annotation group nor inside one
    #[error("Node {node} is not part of an annotation group")]
    NotAnAnnotationGroup {
        /// The node that was checked.
        node: NodeId,
    },

    /// The annotation group carries no UUID
    #[error("Annotation group {node} is missing its UUID")]
    MissingUuid {
        /// The group node.
        node: NodeId,
    },

    /// An operation needed a selection and there was none
    #[error("No element selected")]
    NoSelection,
}

/// Main error type for Markin
///
/// Wraps the layer-specific errors above.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lookup error
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is a lookup error
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Error::Lookup(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
