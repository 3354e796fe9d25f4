//! # Markin Editor
//!
//! The interaction core of the Markin annotation editor. It owns a scene
//! graph of annotation groups (bounding boxes, polygons and keypoints) and
//! turns pointer and keyboard input into selection, drags, resizes, vertex
//! edits, binding propagation, containment, cascading deletes and undoable
//! history.
//!
//! ## Core Components
//!
//! - **Scene**: owned node arena with document-order queries
//! - **Factory**: zoom-normalized primitive construction
//! - **Selection / Handles**: single selection with highlight and handles
//! - **History**: bounded snapshot undo/redo
//! - **Annotator**: input state machine and annotation lifecycle
//! - **Export**: structured annotation records with optional normalization
//!
//! ## Architecture
//!
//! ```text
//! Annotator (input, lifecycle)
//!   ├── Scene (nodes)
//!   │     └── Factory (new nodes)
//!   ├── SelectionManager + HandleManager (decoration)
//!   ├── HistoryManager (snapshots)
//!   └── EventBus (observers)
//!
//! Export (records from the scene)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use markin_editor::{AnnotationOptions, Annotator, AnnotatorOptions, Key, KeyInput};
//!
//! let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
//! annotator.create_annotation(AnnotationOptions {
//!     bbox: Some([10.0, 10.0, 110.0, 60.0]),
//!     ..Default::default()
//! });
//! annotator.key_down(&KeyInput::new(Key::ArrowRight));
//!
//! let document = annotator.export_all_annotations(&Default::default());
//! assert_eq!(document.annotations[0].bbox.as_ref().unwrap().x, 11.0);
//! ```

pub mod annotator;
pub mod config;
pub mod export;
pub mod factory;
pub mod handles;
pub mod history;
pub mod scene;
pub mod selection_manager;
pub mod viewport;

pub use annotator::{
    resize_rect, AnnotationLookup, AnnotationOptions, Annotator, DragSession, InteractionState,
    Key, KeyInput, KeypointOptions, KeypointSpec, ResizeInfo, SelectedElement,
};
pub use config::{default_deletion_rules, parse_deletion_rules, AnnotatorOptions, DeletionRules};
pub use export::{
    export_annotation, AnnotationRecord, AnnotationsDocument, BboxRecord, ElementRecord,
    ExportOptions, KeypointRecord, Normalization, PolygonRecord, SelectedExport,
};
pub use factory::ShapeFactory;
pub use handles::{CrossIndicator, HandleManager};
pub use history::{HistoryEntry, HistoryManager};
pub use scene::{GroupData, HandleTag, Node, SavedHighlight, Scene, Shape, Style};
pub use selection_manager::SelectionManager;
pub use viewport::Viewport;
