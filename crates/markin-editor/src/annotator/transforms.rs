//! Geometry changes: moves, corner resizes, bound-element propagation and
//! containment.

use markin_core::event_bus::{AnnotatorEvent, ModificationEvent};
use markin_core::{Bounds, Corner, ModificationKind, NodeId, Point, Role, ShapeKind};

use super::Annotator;
use crate::scene::{Node, Shape};

/// Rectangle geometry before and after a resize step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeInfo {
    pub original: Bounds,
    pub resized: Bounds,
}

impl ResizeInfo {
    pub fn delta_x(&self) -> f64 {
        self.resized.x - self.original.x
    }

    pub fn delta_y(&self) -> f64 {
        self.resized.y - self.original.y
    }

    pub fn scale_x(&self) -> f64 {
        self.resized.width / self.original.width
    }

    pub fn scale_y(&self) -> f64 {
        self.resized.height / self.original.height
    }

    /// Keeps `p` at the same fractional position inside the rectangle.
    pub fn reposition(&self, p: Point) -> Point {
        let o = &self.original;
        let rel_x = (p.x - o.x) / o.width;
        let rel_y = (p.y - o.y) / o.height;
        Point::new(
            self.delta_x() + o.x + rel_x * o.width * self.scale_x(),
            self.delta_y() + o.y + rel_y * o.height * self.scale_y(),
        )
    }
}

/// Applies a canvas-space delta to the `corner` being dragged.
///
/// The opposite corner stays put. Returns `None` when the result would have
/// a non-positive width or height.
pub fn resize_rect(rect: Bounds, corner: Corner, delta: Point) -> Option<Bounds> {
    let Bounds {
        mut x,
        mut y,
        mut width,
        mut height,
    } = rect;
    match corner {
        Corner::TopLeft => {
            x += delta.x;
            y += delta.y;
            width -= delta.x;
            height -= delta.y;
        }
        Corner::TopRight => {
            y += delta.y;
            width += delta.x;
            height -= delta.y;
        }
        Corner::BottomLeft => {
            x += delta.x;
            width -= delta.x;
            height += delta.y;
        }
        Corner::BottomRight => {
            width += delta.x;
            height += delta.y;
        }
    }
    (width > 0.0 && height > 0.0).then(|| Bounds::new(x, y, width, height))
}

/// Translation that brings `shape` back inside `container`.
///
/// Each axis is corrected on the side it overflows; the left/top edge wins
/// when the shape is larger than the container.
fn containment_shift(shape: &Bounds, container: &Bounds) -> (f64, f64) {
    let dx = if shape.x < container.x {
        container.x - shape.x
    } else if shape.right() > container.right() {
        container.right() - shape.right()
    } else {
        0.0
    };
    let dy = if shape.y < container.y {
        container.y - shape.y
    } else if shape.bottom() > container.bottom() {
        container.bottom() - shape.bottom()
    } else {
        0.0
    };
    (dx, dy)
}

/// Whether `container`'s contain rules cover `node`.
fn governed_by(node: &Node, rules: &[String]) -> bool {
    let has = |name: &str| rules.iter().any(|r| r == name);
    if node.role.as_ref().is_some_and(|role| has(role.as_str())) {
        return true;
    }
    match node.kind() {
        ShapeKind::Circle => has(Role::Keypoint.as_str()),
        ShapeKind::Polygon => has(Role::Polygon.as_str()),
        _ => false,
    }
}

impl Annotator {
    /// Moves `node` by a canvas-space delta.
    ///
    /// Rectangles carry their bound shapes along; polygons and circles are
    /// re-contained afterwards. Groups move every content child, except
    /// children that follow a sibling through a binding, which the sibling
    /// already moves.
    pub fn move_element_by_delta(&mut self, node: NodeId, dx: f64, dy: f64) {
        let Some(kind) = self.scene.kind(node) else {
            tracing::warn!("Cannot move {}: not in scene", node);
            return;
        };

        match kind {
            ShapeKind::Rect | ShapeKind::Line => {
                self.translate_node(node, dx, dy);
                self.update_bound_elements(node, dx, dy);
            }
            ShapeKind::Polygon | ShapeKind::Circle => {
                self.translate_node(node, dx, dy);
                self.update_bound_elements(node, dx, dy);
                self.enforce_containment(node);
            }
            ShapeKind::Group => {
                for child in self.group_move_targets(node) {
                    self.move_element_by_delta(child, dx, dy);
                }
            }
        }

        self.bus
            .emit(AnnotatorEvent::Modification(ModificationEvent::ElementMoved {
                node,
                kind,
                delta_x: dx,
                delta_y: dy,
            }));
    }

    fn group_move_targets(&self, group: NodeId) -> Vec<NodeId> {
        let children = self.scene.children(Some(group));
        let sibling_ids: Vec<&str> = children
            .iter()
            .filter_map(|c| self.scene.get(*c)?.element_id.as_deref())
            .collect();
        children
            .iter()
            .copied()
            .filter(|c| {
                self.scene.get(*c).is_some_and(|n| {
                    !n.is_transient()
                        && !(self.options.bind_elements
                            && n.bound_to
                                .as_deref()
                                .is_some_and(|target| sibling_ids.contains(&target)))
                })
            })
            .collect()
    }

    /// Translates one node and repositions its affordances.
    pub(crate) fn translate_node(&mut self, node: NodeId, dx: f64, dy: f64) {
        if let Some(n) = self.scene.get_mut(node) {
            n.translate(dx, dy);
        }
        self.handles.update_handle_positions(&mut self.scene, node);
    }

    /// Applies a corner drag to a rectangle.
    ///
    /// Degenerate results are dropped without any event.
    pub(crate) fn resize_rect_node(&mut self, rect: NodeId, corner: Corner, delta: Point) {
        let Some(original) = self.scene.get(rect).and_then(|n| match n.shape {
            Shape::Rect { .. } => n.bounds(),
            _ => None,
        }) else {
            return;
        };
        let Some(resized) = resize_rect(original, corner, delta) else {
            tracing::trace!("Rejected degenerate resize of {}", rect);
            return;
        };

        if let Some(Shape::Rect {
            x,
            y,
            width,
            height,
        }) = self.scene.get_mut(rect).map(|n| &mut n.shape)
        {
            *x = resized.x;
            *y = resized.y;
            *width = resized.width;
            *height = resized.height;
        }
        self.handles.update_rect_handle_positions(&mut self.scene, rect);

        let info = ResizeInfo { original, resized };
        self.update_bound_elements_on_resize(rect, &info);

        if info.delta_x() != 0.0 || info.delta_y() != 0.0 {
            self.bus
                .emit(AnnotatorEvent::Modification(ModificationEvent::ElementMoved {
                    node: rect,
                    kind: ShapeKind::Rect,
                    delta_x: info.delta_x(),
                    delta_y: info.delta_y(),
                }));
        }
        self.emit_modified(rect, ModificationKind::Resize, None);
    }

    /// Translates every shape bound to `target` by the same delta.
    ///
    /// Containment is not re-applied to the followers.
    pub(crate) fn update_bound_elements(&mut self, target: NodeId, dx: f64, dy: f64) {
        if !self.options.bind_elements {
            return;
        }
        let Some(target_id) = self.scene.get(target).and_then(|n| n.element_id.clone()) else {
            return;
        };
        for bound in self.scene.bound_to(&target_id) {
            if bound == target {
                continue;
            }
            self.translate_node(bound, dx, dy);
        }
    }

    /// Keeps bound circles and polygons at their relative position inside a
    /// resized rectangle, then re-applies containment to the rectangle.
    pub(crate) fn update_bound_elements_on_resize(&mut self, target: NodeId, info: &ResizeInfo) {
        if !self.options.bind_elements {
            return;
        }
        let Some(target_id) = self.scene.get(target).and_then(|n| n.element_id.clone()) else {
            return;
        };

        for bound in self.scene.bound_to(&target_id) {
            let Some(node) = self.scene.get_mut(bound) else {
                continue;
            };
            match &mut node.shape {
                Shape::Circle { cx, cy, .. } => {
                    let p = info.reposition(Point::new(*cx, *cy));
                    *cx = p.x;
                    *cy = p.y;
                }
                Shape::Polygon { points } => {
                    for p in points.iter_mut() {
                        *p = info.reposition(*p);
                    }
                }
                _ => continue,
            }
            self.handles.update_handle_positions(&mut self.scene, bound);
        }

        self.enforce_containment(target);
    }

    /// Clamps `node` inside every container that governs it.
    ///
    /// A container governs a node when one of its contain rules names the
    /// node's role (circles count as keypoints, polygons as polygons) and
    /// both sit in the same annotation group. Circles and rectangles are
    /// clamped per axis; polygons are shifted as a whole, never distorted.
    pub fn enforce_containment(&mut self, node: NodeId) {
        let Some(n) = self.scene.get(node) else {
            return;
        };
        if n.ignore_containment {
            return;
        }
        let group = self.scene.closest_annotation_group(node);

        for container in self.scene.containers() {
            if container == node {
                continue;
            }
            let Some(c) = self.scene.get(container) else {
                continue;
            };
            let Some(element) = self.scene.get(node) else {
                return;
            };
            if !governed_by(element, &c.contain) {
                continue;
            }
            if self.scene.closest_annotation_group(container) != group {
                continue;
            }
            let bounds = match &c.shape {
                Shape::Rect { .. } => c.bounds(),
                Shape::Polygon { points } => Bounds::from_points(points),
                _ => None,
            };
            let Some(bounds) = bounds else {
                continue;
            };

            let Some(element) = self.scene.get_mut(node) else {
                return;
            };
            match &mut element.shape {
                Shape::Circle { cx, cy, r, .. } => {
                    let r = *r;
                    *cx = cx.max(bounds.x + r).min(bounds.right() - r);
                    *cy = cy.max(bounds.y + r).min(bounds.bottom() - r);
                }
                Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    *x = x.max(bounds.x).min(bounds.right() - *width);
                    *y = y.max(bounds.y).min(bounds.bottom() - *height);
                }
                Shape::Polygon { points } => {
                    let outside = points.iter().any(|p| !bounds.contains(p));
                    if let Some(extent) = Bounds::from_points(points).filter(|_| outside) {
                        let (dx, dy) = containment_shift(&extent, &bounds);
                        for p in points.iter_mut() {
                            *p = p.translated(dx, dy);
                        }
                    }
                }
                _ => continue,
            }
            self.handles.update_handle_positions(&mut self.scene, node);
        }
    }
}
