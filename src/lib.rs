//! # Markin
//!
//! A headless annotation editor core for images: bounding boxes, polygons
//! and keypoints grouped into annotations, with:
//! - Selection with highlight, resize handles and vertex handles
//! - Drag, corner resize, vertex editing and keyboard nudging
//! - Binding, so shapes follow the bbox they are bound to
//! - Containment of polygons and keypoints inside their bbox
//! - Rule-driven cascading deletes
//! - Snapshot undo/redo and structured export with optional normalization
//!
//! ## Architecture
//!
//! Markin is organized as a workspace with multiple crates:
//!
//! 1. **markin-core** - Geometry, scene data types, errors, event bus
//! 2. **markin-editor** - Scene graph, managers, annotator, export
//! 3. **markin** - Logging setup, scripted session replay and the CLI

pub mod session;

pub use markin_core::{
    AnnotatorEvent, Bounds, ElementData, ElementInfo, Error, EventBus, EventFilter, HandleType,
    ModificationKind, NodeId, Point, Role, ShapeKind,
};

pub use markin_editor::{
    AnnotationLookup, AnnotationOptions, AnnotationRecord, AnnotationsDocument, Annotator,
    AnnotatorOptions, ExportOptions, Key, KeyInput, KeypointOptions, KeypointSpec, Scene,
    SelectedExport,
};

pub use session::{load_steps, Session, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Logs go to stderr so exported JSON on stdout stays clean. The level comes
/// from `RUST_LOG`, defaulting to `info`. With `json` set every line is a
/// JSON object; otherwise the pretty formatter is used.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
