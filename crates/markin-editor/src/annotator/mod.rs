//! The interaction core.
//!
//! [`Annotator`] owns the scene graph together with every manager that works
//! on it and turns pointer and keyboard input into selection, drags, resizes,
//! vertex edits, bound-element propagation, containment, cascading deletes
//! and annotation lifecycle operations. Observers listen on its
//! [`EventBus`]; the host only ever talks to the annotator.
//!
//! # Architecture
//!
//! ```text
//! Annotator
//!   ├── Scene             (owned node arena)
//!   ├── ShapeFactory      (zoom-normalized primitives)
//!   ├── SelectionManager  (selected node id)
//!   ├── HandleManager     (handle / indicator node ids)
//!   ├── HistoryManager    (scene snapshots)
//!   ├── Viewport          (device -> canvas)
//!   └── EventBus          (observers)
//! ```
//!
//! Managers hold node ids only and borrow the scene per call, so a history
//! swap just replaces the scene and resets the managers.

mod annotations;
mod deletion;
mod input;
mod transforms;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use markin_core::constants::HIGHLIGHT_RADIUS_FACTOR;
use markin_core::event_bus::{AnnotatorEvent, EventBus, SettingsEvent};
use markin_core::{ConfigError, ElementData, NodeId, Result, ShapeKind};

use crate::config::{AnnotatorOptions, DeletionRules};
use crate::factory::ShapeFactory;
use crate::handles::HandleManager;
use crate::history::HistoryManager;
use crate::scene::{Scene, Shape};
use crate::selection_manager::SelectionManager;
use crate::viewport::Viewport;

pub use annotations::{AnnotationLookup, AnnotationOptions, KeypointOptions, KeypointSpec};
pub use input::{DragSession, InteractionState, Key, KeyInput};
pub use transforms::{resize_rect, ResizeInfo};

/// Snapshot of the current selection for hosts.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedElement {
    pub node: NodeId,
    pub kind: ShapeKind,
    pub data: Option<ElementData>,
    pub uuid: Option<String>,
    pub class: Option<String>,
}

/// Annotation editor instance.
pub struct Annotator {
    scene: Scene,
    factory: ShapeFactory,
    selection: SelectionManager,
    handles: HandleManager,
    history: Option<HistoryManager>,
    viewport: Viewport,
    bus: EventBus,
    options: AnnotatorOptions,
    zoom: f64,
    enabled: bool,
    state: InteractionState,
    /// Set when a drag ends; clicks before this instant are swallowed.
    drag_guard: Option<Instant>,
    /// Nodes whose body starts a direct drag when pressed.
    armed: BTreeSet<NodeId>,
    /// UUIDs and element ids of created annotation parts.
    registry: BTreeMap<String, NodeId>,
}

impl Annotator {
    /// Creates an annotator over an empty scene.
    ///
    /// Options are validated first; with history enabled the empty scene is
    /// saved as `initial` so undo never empties the stack.
    pub fn new(options: AnnotatorOptions) -> Result<Self> {
        if let Err(e) = options.validate() {
            tracing::error!("Rejecting annotator options: {}", e);
            return Err(e);
        }

        let history = options
            .history_enabled
            .then(|| HistoryManager::new(options.history_max_states));

        let mut annotator = Self {
            scene: Scene::new(),
            factory: ShapeFactory::new(options.zoom),
            selection: SelectionManager::new(),
            handles: HandleManager::new(),
            history,
            viewport: Viewport::new(),
            bus: EventBus::new(),
            zoom: options.zoom,
            options,
            enabled: true,
            state: InteractionState::Idle,
            drag_guard: None,
            armed: BTreeSet::new(),
            registry: BTreeMap::new(),
        };
        annotator.save_state("initial");

        tracing::info!(
            "Annotator initialized with keyboard controls {}",
            if annotator.options.keyboard_controls {
                "enabled"
            } else {
                "disabled"
            }
        );
        Ok(annotator)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn options(&self) -> &AnnotatorOptions {
        &self.options
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn handles(&self) -> &HandleManager {
        &self.handles
    }

    pub fn history(&self) -> Option<&HistoryManager> {
        self.history.as_ref()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging(_))
    }

    /// Node registered under a UUID or element id.
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.registry.get(key).copied()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    /// Selection details, or `None` when nothing is selected.
    pub fn selected_element(&self) -> Option<SelectedElement> {
        let node = self.selection.selected()?;
        let n = self.scene.get(node)?;
        let group = n.group();
        Some(SelectedElement {
            node,
            kind: n.kind(),
            data: self.scene.element_data(node),
            uuid: group.and_then(|g| g.uuid.clone()),
            class: group.map(|g| g.class.clone()).filter(|c| !c.is_empty()),
        })
    }

    /// Geometry and identity of any node.
    pub fn element_data(&self, node: NodeId) -> Option<ElementData> {
        self.scene.element_data(node)
    }

    /// Selects `node` and shows its handles.
    pub fn select(&mut self, node: NodeId) -> bool {
        if !self
            .selection
            .select(&mut self.scene, &mut self.handles, &self.bus, node, self.zoom)
        {
            return false;
        }
        self.handles
            .show_handles_for_element(&mut self.scene, node, self.zoom);
        true
    }

    /// Clears the selection.
    pub fn deselect(&mut self) -> bool {
        self.selection
            .deselect(&mut self.scene, &mut self.handles, &self.bus)
    }

    /// Accepts input again.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        tracing::debug!("Annotator enabled");
        self.bus.emit(AnnotatorEvent::Settings(SettingsEvent::Enabled));
    }

    /// Stops accepting input, dropping the selection and any drag.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.deselect();
        self.state = InteractionState::Idle;
        self.enabled = false;
        tracing::debug!("Annotator disabled");
        self.bus
            .emit(AnnotatorEvent::Settings(SettingsEvent::Disabled));
    }

    pub fn enable_keyboard_controls(&mut self) {
        if self.options.keyboard_controls {
            return;
        }
        self.options.keyboard_controls = true;
        tracing::info!("Keyboard controls enabled");
        self.bus.emit(AnnotatorEvent::Settings(
            SettingsEvent::KeyboardControlsEnabled,
        ));
    }

    pub fn disable_keyboard_controls(&mut self) {
        if !self.options.keyboard_controls {
            return;
        }
        self.options.keyboard_controls = false;
        tracing::info!("Keyboard controls disabled");
        self.bus.emit(AnnotatorEvent::Settings(
            SettingsEvent::KeyboardControlsDisabled,
        ));
    }

    pub fn set_require_selection_to_drag(&mut self, require: bool) {
        self.options.require_selection_to_drag = require;
        self.bus.emit(AnnotatorEvent::Settings(
            SettingsEvent::RequireSelectionToDragChanged {
                require_selection_to_drag: require,
            },
        ));
    }

    /// Replaces the rules stamped onto annotations created from now on.
    pub fn set_deletion_rules(&mut self, rules: DeletionRules) {
        tracing::debug!("Deletion rules set for {} roles", rules.len());
        self.options.deletion_rules = rules;
    }

    /// Sets the zoom and redraws every zoom-dependent size.
    ///
    /// Rejects non-positive or non-finite values without changing anything.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        if !(zoom.is_finite() && zoom > 0.0) {
            tracing::error!("Invalid zoom level {}: must be a positive number", zoom);
            return Err(ConfigError::InvalidZoom { zoom }.into());
        }

        self.zoom = zoom;
        self.factory.set_zoom(zoom);
        self.refresh_for_zoom();

        self.bus
            .emit(AnnotatorEvent::Settings(SettingsEvent::ZoomChanged { zoom }));
        Ok(())
    }

    /// Re-applies the current zoom to every shape and handle.
    pub fn refresh_zoom(&mut self) {
        self.refresh_for_zoom();
    }

    fn refresh_for_zoom(&mut self) {
        let zoom = self.zoom;
        for id in self.scene.document_order() {
            let Some(node) = self.scene.get_mut(id) else {
                continue;
            };
            if node.is_transient() || node.kind() == ShapeKind::Group {
                continue;
            }
            if node.base_stroke_width <= 0.0 {
                node.base_stroke_width = markin_core::constants::DEFAULT_BASE_STROKE_WIDTH;
            }
            node.stroke_width = node.base_stroke_width / zoom;

            let selected = node.selected;
            if let Shape::Circle {
                r,
                base_radius,
                saved,
                ..
            } = &mut node.shape
            {
                *r = *base_radius / zoom;
                if selected {
                    if let Some(saved) = saved.as_mut() {
                        saved.radius = *r;
                        *r = *base_radius * HIGHLIGHT_RADIUS_FACTOR / zoom;
                    }
                }
            }
        }

        if let Some(selected) = self.selection.selected() {
            self.handles.update_handle_positions(&mut self.scene, selected);
            for child in self.scene.children(Some(selected)).to_vec() {
                self.handles.update_handle_positions(&mut self.scene, child);
            }
        }
        self.handles.scale_handles_for_zoom(&mut self.scene, zoom);
    }

    /// Records the current scene under `label`. No-op with history off.
    pub fn save_state(&mut self, label: &str) {
        if let Some(history) = self.history.as_mut() {
            history.save_state(&self.scene, label);
        }
    }

    /// Steps back one history entry. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.as_mut().and_then(|h| h.undo()) {
            Some(scene) => {
                self.apply_state(scene);
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone entry. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.as_mut().and_then(|h| h.redo()) {
            Some(scene) => {
                self.apply_state(scene);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(HistoryManager::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(HistoryManager::can_redo)
    }

    /// Drops all history and records the current scene as `initial`.
    pub fn clear_history(&mut self) {
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
        self.save_state("initial");
    }

    /// Swaps the live scene for `scene`.
    ///
    /// Input is disabled for the swap, manager references are reset against
    /// the new scene, then input is re-enabled if it was on before.
    fn apply_state(&mut self, scene: Scene) {
        let was_enabled = self.enabled;
        self.disable();

        self.scene = scene;
        self.handles.reset();
        self.selection.forget();
        self.armed.clear();
        self.state = InteractionState::Idle;
        self.drag_guard = None;
        self.rebuild_registry();
        tracing::debug!("Applied history state with {} nodes", self.scene.len());

        if was_enabled {
            self.enable();
        }
    }

    fn rebuild_registry(&mut self) {
        self.registry.clear();
        for id in self.scene.document_order() {
            let Some(node) = self.scene.get(id) else {
                continue;
            };
            if let Some(uuid) = node.group().and_then(|g| g.uuid.clone()) {
                self.registry.insert(uuid, id);
            }
            if let Some(element_id) = node.element_id.clone() {
                self.registry.insert(element_id, id);
            }
        }
    }

    fn register(&mut self, key: impl Into<String>, node: NodeId) {
        self.registry.insert(key.into(), node);
    }

    /// Drops every registry entry pointing at `node`.
    fn unregister(&mut self, node: NodeId) {
        self.registry.retain(|_, id| *id != node);
    }
}
