//! Scripted session replay.
//!
//! A script is a JSON array of steps, each tagged with `"step"`:
//!
//! ```json
//! [
//!   {"step": "create", "uuid": "a", "bbox": [10, 10, 110, 60]},
//!   {"step": "select", "target": "bbox-a"},
//!   {"step": "key", "key": "ArrowRight", "shift": true},
//!   {"step": "undo"}
//! ]
//! ```
//!
//! Pointer positions are device coordinates, exactly as a host would
//! deliver them.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use markin_core::{NodeId, Point};
use markin_editor::{
    AnnotationLookup, AnnotationOptions, AnnotationsDocument, Annotator, AnnotatorOptions,
    ExportOptions, KeyInput, KeypointOptions,
};

/// One scripted input or editor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Create(AnnotationOptions),
    Update {
        lookup: AnnotationLookup,
        #[serde(default)]
        options: AnnotationOptions,
    },
    AddKeypoint {
        /// UUID or element id; the selection when absent.
        #[serde(default)]
        target: Option<String>,
        name: String,
        x: f64,
        y: f64,
        #[serde(default)]
        options: KeypointOptions,
    },
    /// Selects the node registered under a UUID or element id.
    Select { target: String },
    Deselect,
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    Key(KeyInput),
    Zoom { zoom: f64 },
    CanvasSize { width: f64, height: f64 },
    Undo,
    Redo,
    DeleteSelected,
    SaveState { label: String },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Create(_) => "create",
            Step::Update { .. } => "update",
            Step::AddKeypoint { .. } => "add_keypoint",
            Step::Select { .. } => "select",
            Step::Deselect => "deselect",
            Step::PointerDown { .. } => "pointer_down",
            Step::PointerMove { .. } => "pointer_move",
            Step::PointerUp { .. } => "pointer_up",
            Step::PointerLeave { .. } => "pointer_leave",
            Step::Click { .. } => "click",
            Step::Key(_) => "key",
            Step::Zoom { .. } => "zoom",
            Step::CanvasSize { .. } => "canvas_size",
            Step::Undo => "undo",
            Step::Redo => "redo",
            Step::DeleteSelected => "delete_selected",
            Step::SaveState { .. } => "save_state",
        }
    }
}

/// Reads a step list from a JSON file.
pub fn load_steps(path: &Path) -> Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse script {}", path.display()))
}

/// An annotator driven by script steps.
pub struct Session {
    annotator: Annotator,
}

impl Session {
    pub fn new(options: AnnotatorOptions) -> Result<Self> {
        let annotator = Annotator::new(options).context("Failed to create annotator")?;
        Ok(Self { annotator })
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Applies `steps` in order, stopping at the first failure.
    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            self.apply(step)
                .with_context(|| format!("Step {} ({}) failed", index, step.name()))?;
        }
        tracing::info!("Replayed {} steps", steps.len());
        Ok(())
    }

    pub fn apply(&mut self, step: &Step) -> Result<()> {
        tracing::debug!("Applying step {}", step.name());
        let annotator = &mut self.annotator;
        match step {
            Step::Create(options) => {
                annotator.create_annotation(options.clone());
            }
            Step::Update { lookup, options } => {
                annotator.update_annotation(lookup.clone(), options.clone())?;
            }
            Step::AddKeypoint {
                target,
                name,
                x,
                y,
                options,
            } => {
                let target = match target {
                    Some(key) => Some(resolve(annotator, key)?),
                    None => None,
                };
                annotator.add_keypoint(target, name, *x, *y, options.clone())?;
            }
            Step::Select { target } => {
                let node = resolve(annotator, target)?;
                annotator.select(node);
            }
            Step::Deselect => {
                annotator.deselect();
            }
            Step::PointerDown { x, y } => {
                annotator.pointer_down(Point::new(*x, *y));
            }
            Step::PointerMove { x, y } => annotator.pointer_move(Point::new(*x, *y)),
            Step::PointerUp { x, y } => annotator.pointer_up(Point::new(*x, *y)),
            Step::PointerLeave { x, y } => annotator.pointer_leave(Point::new(*x, *y)),
            Step::Click { x, y } => annotator.click(Point::new(*x, *y)),
            Step::Key(input) => {
                annotator.key_down(input);
            }
            Step::Zoom { zoom } => annotator.set_zoom(*zoom)?,
            Step::CanvasSize { width, height } => {
                annotator.viewport_mut().set_canvas_size(*width, *height)
            }
            Step::Undo => {
                annotator.undo();
            }
            Step::Redo => {
                annotator.redo();
            }
            Step::DeleteSelected => annotator.delete_selected_element()?,
            Step::SaveState { label } => annotator.save_state(label),
        }
        Ok(())
    }

    pub fn export(&self, options: &ExportOptions) -> AnnotationsDocument {
        self.annotator.export_all_annotations(options)
    }
}

fn resolve(annotator: &Annotator, key: &str) -> Result<NodeId> {
    match annotator.lookup(key) {
        Some(node) => Ok(node),
        None => bail!("Nothing registered under '{}'", key),
    }
}
