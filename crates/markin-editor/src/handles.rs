//! Handle management.
//!
//! Handles are transient scene nodes placed next to the shape they
//! manipulate: four corner handles for rectangles, one handle per polygon
//! vertex, and a cross indicator for circles. Updates reposition the
//! existing nodes in place; handle identity only changes when the selection
//! does.

use markin_core::constants::{HANDLE_RADIUS, HIGHLIGHT_DASH};
use markin_core::{Corner, HandleType, NodeId, Point, Role, ShapeKind};

use crate::scene::{HandleTag, Node, Scene, Shape, Style};

/// Cross-hair drawn over a selected circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossIndicator {
    pub target: NodeId,
    pub vertical: NodeId,
    pub horizontal: NodeId,
}

/// Tracks the handles and indicators shown for the current selection.
#[derive(Debug, Clone)]
pub struct HandleManager {
    handles: Vec<NodeId>,
    indicator: Option<CrossIndicator>,
    handle_radius: f64,
}

impl HandleManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            indicator: None,
            handle_radius: HANDLE_RADIUS,
        }
    }

    /// Handle nodes currently shown.
    pub fn handles(&self) -> &[NodeId] {
        &self.handles
    }

    pub fn indicator(&self) -> Option<CrossIndicator> {
        self.indicator
    }

    /// Handle tagged with `handle_type` (and `index` for vertices).
    pub fn find_handle(&self, scene: &Scene, handle_type: HandleType, index: usize) -> Option<NodeId> {
        self.handles.iter().copied().find(|id| {
            scene
                .get(*id)
                .and_then(|n| n.handle.as_ref())
                .is_some_and(|tag| tag.handle_type == handle_type && tag.index == index)
        })
    }

    /// Shows the affordances for `node` according to its kind.
    ///
    /// A group delegates to its bbox child when its first content child is
    /// one: the group is flagged has-selected-child and only the child gets
    /// the dashed outline.
    pub fn show_handles_for_element(&mut self, scene: &mut Scene, node: NodeId, zoom: f64) {
        let Some(kind) = scene.kind(node) else {
            return;
        };
        match kind {
            ShapeKind::Rect => self.show_rect_handles(scene, node, zoom),
            ShapeKind::Polygon => self.show_polygon_vertices(scene, node, zoom),
            ShapeKind::Circle => self.add_cross_indicator(scene, node),
            ShapeKind::Line => {}
            ShapeKind::Group => {
                let first = scene
                    .children(Some(node))
                    .iter()
                    .copied()
                    .find(|c| scene.get(*c).is_some_and(|n| !n.is_transient()));
                let Some(bbox) = first.filter(|c| {
                    scene
                        .get(*c)
                        .is_some_and(|n| n.kind() == ShapeKind::Rect && n.has_role(&Role::Bbox))
                }) else {
                    return;
                };
                if let Some(group) = scene.get_mut(node) {
                    group.selected = false;
                    group.has_selected_child = true;
                }
                if let Some(child) = scene.get_mut(bbox) {
                    child.selected = true;
                    child.style.dash_array = Some(HIGHLIGHT_DASH.to_string());
                }
                self.show_rect_handles(scene, bbox, zoom);
            }
        }
    }

    fn show_rect_handles(&mut self, scene: &mut Scene, rect: NodeId, zoom: f64) {
        let Some(corners) = rect_corners(scene, rect) else {
            return;
        };
        for corner in Corner::ALL {
            self.create_handle(
                scene,
                rect,
                corners[corner.index()],
                HandleType::from_corner(corner),
                corner.index(),
                zoom,
            );
        }
    }

    fn show_polygon_vertices(&mut self, scene: &mut Scene, polygon: NodeId, zoom: f64) {
        let points = match scene.get(polygon).map(|n| &n.shape) {
            Some(Shape::Polygon { points }) => points.clone(),
            _ => return,
        };
        for (index, point) in points.into_iter().enumerate() {
            self.create_handle(scene, polygon, point, HandleType::Vertex, index, zoom);
        }
    }

    /// Places a handle for `target` at `position`.
    ///
    /// The handle goes into the target's parent group, or the root when the
    /// target is top level.
    pub fn create_handle(
        &mut self,
        scene: &mut Scene,
        target: NodeId,
        position: Point,
        handle_type: HandleType,
        index: usize,
        zoom: f64,
    ) -> NodeId {
        let mut node = Node::new(Shape::Circle {
            cx: position.x,
            cy: position.y,
            r: self.handle_radius / zoom,
            base_radius: self.handle_radius,
            saved: None,
        })
        .with_role(Role::Handle)
        .with_style(Style {
            fill: Some("black".to_string()),
            stroke: Some("white".to_string()),
            fill_opacity: Some("0.5".to_string()),
            class: Some("HandleElement".to_string()),
            ..Default::default()
        });
        node.stroke_width = 1.0;
        node.handle = Some(HandleTag {
            handle_type,
            index,
            target,
            base_radius: self.handle_radius,
        });

        let parent = scene.parent(target);
        let id = scene.insert(node, parent);
        self.handles.push(id);
        id
    }

    /// Draws a cross indicator over `circle`, replacing any previous one.
    pub fn add_cross_indicator(&mut self, scene: &mut Scene, circle: NodeId) {
        self.remove_indicator(scene);
        let Some(Shape::Circle { cx, cy, r, .. }) = scene.get(circle).map(|n| n.shape.clone()) else {
            return;
        };
        let parent = scene.parent(circle);
        let line = |x1: f64, y1: f64, x2: f64, y2: f64| {
            let mut node = Node::new(Shape::Line { x1, y1, x2, y2 })
                .with_role(Role::CrossIndicator)
                .with_style(Style {
                    stroke: Some("#000000".to_string()),
                    stroke_opacity: Some("0.35".to_string()),
                    ..Default::default()
                });
            node.stroke_width = 1.0;
            node
        };
        let vertical = scene.insert(line(cx, cy - r, cx, cy + r), parent);
        let horizontal = scene.insert(line(cx - r, cy, cx + r, cy), parent);
        self.indicator = Some(CrossIndicator {
            target: circle,
            vertical,
            horizontal,
        });
    }

    /// Repositions whatever affordances `node` has.
    pub fn update_handle_positions(&mut self, scene: &mut Scene, node: NodeId) {
        match scene.get(node).map(|n| (n.kind(), n.selected)) {
            Some((ShapeKind::Rect, _)) => self.update_rect_handle_positions(scene, node),
            Some((ShapeKind::Polygon, _)) => self.update_polygon_handle_positions(scene, node),
            Some((ShapeKind::Circle, true)) => self.update_cross_indicator(scene, node),
            _ => {}
        }
    }

    pub fn update_rect_handle_positions(&mut self, scene: &mut Scene, rect: NodeId) {
        let Some(corners) = rect_corners(scene, rect) else {
            return;
        };
        self.move_handles(scene, rect, |tag| {
            tag.handle_type.corner().map(|c| corners[c.index()])
        });
    }

    pub fn update_polygon_handle_positions(&mut self, scene: &mut Scene, polygon: NodeId) {
        let points = match scene.get(polygon).map(|n| &n.shape) {
            Some(Shape::Polygon { points }) => points.clone(),
            _ => return,
        };
        self.move_handles(scene, polygon, |tag| {
            (tag.handle_type == HandleType::Vertex)
                .then(|| points.get(tag.index).copied())
                .flatten()
        });
    }

    /// Re-centres the cross indicator on `circle` and resizes it to its radius.
    pub fn update_cross_indicator(&mut self, scene: &mut Scene, circle: NodeId) {
        let Some(indicator) = self.indicator.filter(|i| i.target == circle) else {
            return;
        };
        let Some(Shape::Circle { cx, cy, r, .. }) = scene.get(circle).map(|n| n.shape.clone()) else {
            return;
        };
        set_line(scene, indicator.vertical, cx, cy - r, cx, cy + r);
        set_line(scene, indicator.horizontal, cx - r, cy, cx + r, cy);
    }

    /// Keeps handles at a constant on-screen size.
    pub fn scale_handles_for_zoom(&mut self, scene: &mut Scene, zoom: f64) {
        for id in &self.handles {
            if let Some(node) = scene.get_mut(*id) {
                let base = node
                    .handle
                    .as_ref()
                    .map(|t| t.base_radius)
                    .unwrap_or(self.handle_radius);
                if let Shape::Circle { r, .. } = &mut node.shape {
                    *r = base / zoom;
                }
            }
        }
    }

    /// Removes every handle and indicator, tracked or not.
    pub fn clear_handles(&mut self, scene: &mut Scene) {
        for id in self.handles.drain(..) {
            scene.remove(id);
        }
        self.remove_indicator(scene);

        let strays = scene.transient_nodes();
        if !strays.is_empty() {
            tracing::debug!("Sweeping {} stray handle nodes", strays.len());
        }
        for id in strays {
            scene.remove(id);
        }
    }

    /// Forgets tracked nodes without touching the scene.
    ///
    /// Used after a history swap, when the tracked ids belong to a scene that
    /// no longer exists.
    pub fn reset(&mut self) {
        self.handles.clear();
        self.indicator = None;
    }

    fn remove_indicator(&mut self, scene: &mut Scene) {
        if let Some(indicator) = self.indicator.take() {
            scene.remove(indicator.vertical);
            scene.remove(indicator.horizontal);
        }
    }

    fn move_handles(&self, scene: &mut Scene, target: NodeId, position: impl Fn(&HandleTag) -> Option<Point>) {
        for id in &self.handles {
            let Some(node) = scene.get_mut(*id) else {
                continue;
            };
            let Some(p) = node
                .handle
                .as_ref()
                .filter(|tag| tag.target == target)
                .and_then(&position)
            else {
                continue;
            };
            if let Shape::Circle { cx, cy, .. } = &mut node.shape {
                *cx = p.x;
                *cy = p.y;
            }
        }
    }
}

impl Default for HandleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Corner positions in handle index order (tl, tr, bl, br).
fn rect_corners(scene: &Scene, rect: NodeId) -> Option<[Point; 4]> {
    match scene.get(rect).map(|n| &n.shape) {
        Some(Shape::Rect {
            x,
            y,
            width,
            height,
        }) => Some([
            Point::new(*x, *y),
            Point::new(x + width, *y),
            Point::new(*x, y + height),
            Point::new(x + width, y + height),
        ]),
        _ => None,
    }
}

fn set_line(scene: &mut Scene, id: NodeId, nx1: f64, ny1: f64, nx2: f64, ny2: f64) {
    if let Some(Shape::Line { x1, y1, x2, y2 }) = scene.get_mut(id).map(|n| &mut n.shape) {
        *x1 = nx1;
        *y1 = ny1;
        *x2 = nx2;
        *y2 = ny2;
    }
}
