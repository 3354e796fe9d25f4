//! Pointer and keyboard input.
//!
//! Positions arrive in device coordinates and go through the viewport. The
//! host delivers pointer down / move / up / leave and the click that follows
//! a press, plus key presses.
//!
//! A press on a handle starts a handle drag. A press on a shape bubbles from
//! the hit node up through its ancestors to the first node armed for direct
//! drag; with require-selection-to-drag on, only the selected node may start
//! one, so the first press on anything else falls through to the click that
//! selects it.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use markin_core::constants::{
    DRAG_CLICK_GUARD, HIT_TOLERANCE, NUDGE_STEP, NUDGE_STEP_PRECISE, NUDGE_STEP_WIDE,
};
use markin_core::event_bus::{
    AnnotatorEvent, DragEvent, HoverEvent, ModificationData, ModificationEvent,
};
use markin_core::{ElementData, HandleType, ModificationKind, NodeId, Point, ShapeKind};

use super::Annotator;
use crate::selection_manager::SelectionManager;

/// An in-flight drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub target: NodeId,
    pub handle_type: HandleType,
    /// Vertex or corner index for handle drags.
    pub index: Option<usize>,
    pub start_device: Point,
    pub last_device: Point,
    pub start_canvas: Point,
    /// Target data when the drag began.
    pub original: Option<ElementData>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering(NodeId),
    Dragging(DragSession),
}

/// Keys the annotator reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Backspace,
    Char(char),
    Other(String),
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        match name.as_str() {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other(name),
                }
            }
        }
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        match key {
            Key::ArrowLeft => "ArrowLeft".to_string(),
            Key::ArrowRight => "ArrowRight".to_string(),
            Key::ArrowUp => "ArrowUp".to_string(),
            Key::ArrowDown => "ArrowDown".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::Char(c) => c.to_string(),
            Key::Other(name) => name,
        }
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

impl Annotator {
    fn hit_test(&self, canvas: Point) -> Option<NodeId> {
        self.scene.node_at(&canvas, HIT_TOLERANCE / self.zoom)
    }

    /// Pointer pressed at a device position.
    ///
    /// Returns true when a drag session started.
    pub fn pointer_down(&mut self, device: Point) -> bool {
        if !self.enabled || self.is_dragging() {
            return false;
        }
        let canvas = self.viewport.to_canvas_point(device);
        let Some(hit) = self.hit_test(canvas) else {
            return false;
        };

        let tag = self.scene.get(hit).and_then(|n| n.handle.clone());
        if let Some(tag) = tag {
            return self.start_handle_drag(tag.target, tag.handle_type, tag.index, device, canvas);
        }

        let candidate = std::iter::once(hit)
            .chain(self.scene.ancestors(hit))
            .filter(|n| self.armed.contains(n))
            .find(|n| {
                !self.options.require_selection_to_drag || self.selection.selected() == Some(*n)
            });
        match candidate {
            Some(node) => {
                self.start_session(node, HandleType::DirectMove, None, device, canvas);
                true
            }
            None => false,
        }
    }

    fn start_handle_drag(
        &mut self,
        target: NodeId,
        handle_type: HandleType,
        index: usize,
        device: Point,
        canvas: Point,
    ) -> bool {
        if !self.scene.contains(target) {
            return false;
        }
        self.selection
            .select(&mut self.scene, &mut self.handles, &self.bus, target, self.zoom);

        if let Some(parent) = self.scene.parent(target) {
            if let Some(group) = self
                .scene
                .get_mut(parent)
                .filter(|n| n.kind() == ShapeKind::Group)
            {
                group.selected = false;
                group.has_selected_child = true;
            }
        }
        self.handles
            .show_handles_for_element(&mut self.scene, target, self.zoom);

        self.start_session(target, handle_type, Some(index), device, canvas);
        true
    }

    fn start_session(
        &mut self,
        target: NodeId,
        handle_type: HandleType,
        index: Option<usize>,
        device: Point,
        canvas: Point,
    ) {
        let kind = self.scene.kind(target).unwrap_or(ShapeKind::Group);
        tracing::debug!("Starting {} drag of {} {}", handle_type, kind, target);

        self.state = InteractionState::Dragging(DragSession {
            target,
            handle_type,
            index,
            start_device: device,
            last_device: device,
            start_canvas: canvas,
            original: self.scene.element_data(target),
        });
        self.bus.emit(AnnotatorEvent::Drag(DragEvent::Start {
            node: target,
            kind,
            handle_type,
            position: canvas,
        }));
    }

    /// Pointer moved to a device position.
    ///
    /// Drives the active drag, or updates hover state when there is none.
    pub fn pointer_move(&mut self, device: Point) {
        if !self.enabled {
            return;
        }
        let canvas = self.viewport.to_canvas_point(device);
        if !self.is_dragging() {
            self.update_hover(canvas);
            return;
        }
        let InteractionState::Dragging(session) = &mut self.state else {
            return;
        };
        let device_delta = Point::new(
            device.x - session.last_device.x,
            device.y - session.last_device.y,
        );
        session.last_device = device;
        let (target, handle_type, index) = (session.target, session.handle_type, session.index);
        let delta = self.viewport.to_canvas_delta(device_delta);

        let Some(kind) = self.scene.kind(target) else {
            tracing::warn!("Drag target {} vanished; ending drag", target);
            self.state = InteractionState::Idle;
            return;
        };

        match (kind, handle_type) {
            (ShapeKind::Rect, handle) if handle.corner().is_some() => {
                if let Some(corner) = handle.corner() {
                    self.resize_rect_node(target, corner, delta);
                }
            }
            (ShapeKind::Rect, handle) if handle.is_move() => {
                self.translate_node(target, delta.x, delta.y);
                self.update_bound_elements(target, delta.x, delta.y);
            }
            (ShapeKind::Polygon, HandleType::Vertex) => {
                if let Some(i) = index {
                    self.move_vertex(target, i, canvas);
                }
            }
            (ShapeKind::Polygon, handle) if handle.is_move() => {
                self.translate_node(target, delta.x, delta.y);
                self.update_bound_elements(target, delta.x, delta.y);
                self.enforce_containment(target);
                self.emit_modified(target, ModificationKind::Position, None);
            }
            (ShapeKind::Circle, handle) if handle.is_move() => {
                self.translate_node(target, delta.x, delta.y);
                self.enforce_containment(target);
                self.emit_modified(target, ModificationKind::Position, None);
            }
            _ => {}
        }

        self.bus.emit(AnnotatorEvent::Drag(DragEvent::Moved {
            node: target,
            kind,
            handle_type,
            position: canvas,
            delta,
        }));
    }

    fn move_vertex(&mut self, polygon: NodeId, index: usize, canvas: Point) {
        let moved = match self.scene.get_mut(polygon).map(|n| &mut n.shape) {
            Some(crate::scene::Shape::Polygon { points }) => match points.get_mut(index) {
                Some(p) => {
                    *p = canvas;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !moved {
            return;
        }
        self.handles
            .update_polygon_handle_positions(&mut self.scene, polygon);
        self.enforce_containment(polygon);
        self.emit_modified(polygon, ModificationKind::Vertex, Some(index));
    }

    fn update_hover(&mut self, canvas: Point) {
        let target = self
            .hit_test(canvas)
            .and_then(|hit| SelectionManager::find_selectable_element(&self.scene, hit));
        match target.and_then(|node| self.scene.kind(node).map(|kind| (node, kind))) {
            Some((node, kind)) => {
                self.state = InteractionState::Hovering(node);
                self.bus.emit(AnnotatorEvent::Hover(HoverEvent::Element {
                    node,
                    kind,
                    position: canvas,
                }));
            }
            None => {
                self.state = InteractionState::Idle;
                self.bus
                    .emit(AnnotatorEvent::Hover(HoverEvent::Canvas { position: canvas }));
            }
        }
    }

    /// Pointer released; completes the active drag.
    ///
    /// With a nonzero total displacement the move is reported and a history
    /// entry `move_<tag>` is saved. The target stays selected and clicks are
    /// ignored for a short while so the release's trailing click does not
    /// reselect.
    pub fn pointer_up(&mut self, device: Point) {
        let InteractionState::Dragging(session) = std::mem::take(&mut self.state) else {
            return;
        };
        let end = self.viewport.to_canvas_point(device);
        let target = session.target;
        let handle_type = session.handle_type;
        let kind = self.scene.kind(target).unwrap_or(ShapeKind::Group);

        self.bus.emit(AnnotatorEvent::Drag(DragEvent::End {
            node: target,
            kind,
            handle_type,
            start_position: session.start_canvas,
            end_position: end,
            data: self.scene.element_data(target),
        }));

        let dx = end.x - session.start_canvas.x;
        let dy = end.y - session.start_canvas.y;
        if dx != 0.0 || dy != 0.0 {
            self.bus
                .emit(AnnotatorEvent::Modification(ModificationEvent::ElementMoved {
                    node: target,
                    kind,
                    delta_x: dx,
                    delta_y: dy,
                }));
            self.emit_modified(target, ModificationKind::Position, None);
            self.emit_complete(target, handle_type.modification(), Some(handle_type));
            self.save_state(&format!("move_{}", kind.tag()));
        }

        if self.scene.contains(target) {
            self.select(target);
        }
        self.drag_guard = Some(Instant::now() + DRAG_CLICK_GUARD);
    }

    /// Pointer left the surface; ends any drag like a release.
    pub fn pointer_leave(&mut self, device: Point) {
        if self.is_dragging() {
            self.pointer_up(device);
        } else if matches!(self.state, InteractionState::Hovering(_)) {
            self.state = InteractionState::Idle;
        }
    }

    /// Click at a device position: selects what is under it, or clears the
    /// selection on empty canvas.
    pub fn click(&mut self, device: Point) {
        if !self.enabled || self.is_dragging() {
            return;
        }
        if self.drag_guard.is_some_and(|until| Instant::now() < until) {
            tracing::trace!("Ignoring click right after a drag");
            return;
        }
        self.drag_guard = None;

        let canvas = self.viewport.to_canvas_point(device);
        let hit = self.hit_test(canvas);
        if hit
            .and_then(|h| self.scene.get(h))
            .is_some_and(|n| n.is_transient())
        {
            return;
        }

        match hit.and_then(|h| SelectionManager::find_selectable_element(&self.scene, h)) {
            Some(target) => {
                self.select(target);
                self.armed.insert(target);
            }
            None => {
                if self.deselect() {
                    self.bus
                        .emit(AnnotatorEvent::Hover(HoverEvent::CanvasClick { position: canvas }));
                }
            }
        }
    }

    /// Key press.
    ///
    /// Ctrl/Meta+Z undoes and Ctrl/Meta+Shift+Z redoes regardless of the
    /// selection. With a selection, Delete/Backspace deletes it and arrows
    /// nudge it by 1 unit, 10 with Shift, 0.2 with Ctrl/Meta. Returns true
    /// when the key was handled.
    pub fn key_down(&mut self, input: &KeyInput) -> bool {
        if !self.enabled || !self.options.keyboard_controls {
            return false;
        }

        if matches!(input.key, Key::Char('z') | Key::Char('Z')) && input.command() {
            if input.shift {
                self.redo();
            } else {
                self.undo();
            }
            return true;
        }

        let Some(selected) = self.selection.selected() else {
            return false;
        };

        let distance = if input.shift {
            NUDGE_STEP_WIDE
        } else if input.command() {
            NUDGE_STEP_PRECISE
        } else {
            NUDGE_STEP
        };
        let (dx, dy) = match input.key {
            Key::Delete | Key::Backspace => {
                if let Err(e) = self.delete_selected_element() {
                    tracing::warn!("Delete failed: {}", e);
                }
                return true;
            }
            Key::ArrowLeft => (-distance, 0.0),
            Key::ArrowRight => (distance, 0.0),
            Key::ArrowUp => (0.0, -distance),
            Key::ArrowDown => (0.0, distance),
            _ => return false,
        };

        let Some(kind) = self.scene.kind(selected) else {
            return false;
        };
        self.move_element_by_delta(selected, dx, dy);
        self.emit_complete(selected, ModificationKind::Position, Some(HandleType::Keyboard));
        self.save_state(&format!("keyboard_move_{}", kind.tag()));
        true
    }

    pub(crate) fn emit_modified(
        &self,
        node: NodeId,
        modification: ModificationKind,
        vertex_index: Option<usize>,
    ) {
        let Some(kind) = self.scene.kind(node) else {
            return;
        };
        self.bus
            .emit(AnnotatorEvent::Modification(ModificationEvent::AnnotationModified {
                node: Some(node),
                kind,
                modification,
                vertex_index,
                data: ModificationData::from(self.scene.element_data(node)),
            }));
    }

    pub(crate) fn emit_complete(
        &self,
        node: NodeId,
        modification: ModificationKind,
        handle_type: Option<HandleType>,
    ) {
        let Some(kind) = self.scene.kind(node) else {
            return;
        };
        self.bus.emit(AnnotatorEvent::Modification(
            ModificationEvent::AnnotationModificationComplete {
                node: Some(node),
                kind,
                modification,
                handle_type,
                data: ModificationData::from(self.scene.element_data(node)),
            },
        ));
    }
}
