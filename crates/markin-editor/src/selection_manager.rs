use markin_core::constants::{HIGHLIGHT_DASH, HIGHLIGHT_FILL_OPACITY, HIGHLIGHT_RADIUS_FACTOR};
use markin_core::event_bus::{AnnotatorEvent, EventBus, SelectionEvent};
use markin_core::{NodeId, Role, ShapeKind};

use crate::handles::HandleManager;
use crate::scene::{SavedHighlight, Scene, Shape};

/// Manages shape selection state and the selected-shape highlight.
///
/// `SelectionManager` is responsible for:
/// - Tracking the single selected node
/// - Deciding which node a click resolves to (`find_selectable_element`)
/// - Applying and reverting the highlight treatment
///
/// # Selection Model
///
/// - **Single Selection**: at most one node is selected; selecting another
///   node deselects the previous one first
/// - **Groups**: a selected group carries the `selected` flag, but only its
///   bbox child gets the dashed outline
/// - **Circles**: drawn at three times their base radius with a faint fill
///   and a cross indicator; highlighting twice is a no-op
///
/// # Design
///
/// The manager holds only a node id. The scene, handles and event bus are
/// borrowed per call so the annotator stays the single owner of all state.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    /// The selected node, if any
    selected: Option<NodeId>,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with no selection.
    ///
    /// # Examples
    ///
    /// ```
    /// use markin_editor::selection_manager::SelectionManager;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.selected(), None);
    /// ```
    pub fn new() -> Self {
        Self { selected: None }
    }

    /// Returns the selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Returns true if a selection click may land on `node`.
    ///
    /// Rectangles, circles, polygons and groups are selectable; handles,
    /// cross indicators and mask candidates never are.
    pub fn is_selectable(scene: &Scene, node: NodeId) -> bool {
        let Some(n) = scene.get(node) else {
            return false;
        };
        if n.handle.is_some() {
            return false;
        }
        if matches!(
            n.role,
            Some(Role::Handle | Role::CrossIndicator | Role::MaskCandidate)
        ) {
            return false;
        }
        matches!(
            n.kind(),
            ShapeKind::Rect | ShapeKind::Circle | ShapeKind::Polygon | ShapeKind::Group
        )
    }

    /// Walks from `node` up through its ancestors and returns the first
    /// selectable node.
    ///
    /// # Arguments
    ///
    /// * `scene` - The scene to search
    /// * `node` - The node that was hit
    ///
    /// # Returns
    ///
    /// The node itself when it is selectable, otherwise the nearest
    /// selectable ancestor, or `None` when the walk reaches the root.
    pub fn find_selectable_element(scene: &Scene, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(scene.ancestors(node))
            .find(|n| Self::is_selectable(scene, *n))
    }

    /// Selects `node`.
    ///
    /// Deselects a different previous selection, clears existing handles,
    /// highlights the node and emits `select`.
    ///
    /// # Returns
    ///
    /// `false` when the node is not in the scene.
    pub fn select(
        &mut self,
        scene: &mut Scene,
        handles: &mut HandleManager,
        bus: &EventBus,
        node: NodeId,
        zoom: f64,
    ) -> bool {
        let Some(kind) = scene.kind(node) else {
            tracing::warn!("Cannot select {}: not in scene", node);
            return false;
        };

        if self.selected.is_some_and(|current| current != node) {
            self.deselect(scene, handles, bus);
        }

        self.selected = Some(node);
        handles.clear_handles(scene);
        Self::highlight(scene, handles, node, zoom);

        tracing::debug!("Selected {} ({})", node, kind);
        bus.emit(AnnotatorEvent::Selection(SelectionEvent::Select {
            node,
            kind,
            data: scene.element_data(node),
        }));
        true
    }

    /// Clears the selection.
    ///
    /// No-op when nothing is selected. Removes the highlight, clears handles
    /// and emits `deselect`.
    pub fn deselect(&mut self, scene: &mut Scene, handles: &mut HandleManager, bus: &EventBus) -> bool {
        let Some(previous) = self.selected.take() else {
            return false;
        };

        Self::remove_highlight(scene, previous);
        handles.clear_handles(scene);

        let kind = scene.kind(previous).unwrap_or(ShapeKind::Group);
        tracing::debug!("Deselected {}", previous);
        bus.emit(AnnotatorEvent::Selection(SelectionEvent::Deselect {
            node: previous,
            kind,
        }));
        true
    }

    /// Drops the selection reference without touching the scene.
    ///
    /// Used after a history swap replaces the scene the id pointed into.
    pub fn forget(&mut self) {
        self.selected = None;
    }

    fn highlight(scene: &mut Scene, handles: &mut HandleManager, node: NodeId, zoom: f64) {
        let Some(kind) = scene.kind(node) else {
            return;
        };
        match kind {
            ShapeKind::Circle => {
                if let Some(n) = scene.get_mut(node) {
                    if !n.selected {
                        let fill_opacity = n.style.fill_opacity.clone();
                        if let Shape::Circle {
                            r,
                            base_radius,
                            saved,
                            ..
                        } = &mut n.shape
                        {
                            *saved = Some(SavedHighlight {
                                radius: *r,
                                fill_opacity,
                            });
                            *r = *base_radius * HIGHLIGHT_RADIUS_FACTOR / zoom;
                        }
                        n.style.fill_opacity = Some(HIGHLIGHT_FILL_OPACITY.to_string());
                        n.selected = true;
                    }
                }
                handles.add_cross_indicator(scene, node);
            }
            ShapeKind::Group => {
                let bbox = scene.children(Some(node)).iter().copied().find(|c| {
                    scene
                        .get(*c)
                        .is_some_and(|n| n.kind() == ShapeKind::Rect && n.has_role(&Role::Bbox))
                });
                if let Some(n) = scene.get_mut(node) {
                    n.selected = true;
                }
                if let Some(child) = bbox.and_then(|b| scene.get_mut(b)) {
                    child.style.dash_array = Some(HIGHLIGHT_DASH.to_string());
                    child.selected = true;
                }
            }
            _ => {
                if let Some(n) = scene.get_mut(node) {
                    n.style.dash_array = Some(HIGHLIGHT_DASH.to_string());
                    n.selected = true;
                }
            }
        }
    }

    fn remove_highlight(scene: &mut Scene, node: NodeId) {
        let Some(kind) = scene.kind(node) else {
            return;
        };
        match kind {
            ShapeKind::Circle => {
                if let Some(n) = scene.get_mut(node) {
                    if let Shape::Circle { r, saved, .. } = &mut n.shape {
                        if let Some(saved) = saved.take() {
                            *r = saved.radius;
                            n.style.fill_opacity = saved.fill_opacity;
                        }
                    }
                    n.selected = false;
                }
            }
            ShapeKind::Group => {
                let children = scene.children(Some(node)).to_vec();
                if let Some(n) = scene.get_mut(node) {
                    n.selected = false;
                    n.has_selected_child = false;
                }
                for child in children {
                    if let Some(c) = scene.get_mut(child).filter(|c| c.selected) {
                        c.selected = false;
                        c.style.dash_array = None;
                    }
                }
            }
            _ => {
                if let Some(n) = scene.get_mut(node) {
                    n.style.dash_array = None;
                    n.selected = false;
                }
            }
        }
    }
}
