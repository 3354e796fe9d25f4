//! Scene graph for annotation editing.
//!
//! The scene is an owned arena of [`Node`]s keyed by [`NodeId`]. Groups own
//! an ordered child list; every node keeps a back-link to its parent. All
//! "query all" operations walk the tree depth first, so results come back in
//! document order.

use std::collections::{BTreeMap, HashMap};

use markin_core::geometry::{distance_to_segment, point_in_polygon};
use markin_core::{Bounds, ElementData, HandleType, NodeId, Point, Role, ShapeKind};

/// Presentation attributes carried through export and snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub fill_opacity: Option<String>,
    pub stroke_opacity: Option<String>,
    pub dash_array: Option<String>,
    pub class: Option<String>,
}

/// Marks a node as a manipulation handle.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleTag {
    pub handle_type: HandleType,
    /// Corner index (0..3) or vertex index.
    pub index: usize,
    /// The shape this handle manipulates.
    pub target: NodeId,
    /// Radius at zoom 1.
    pub base_radius: f64,
}

/// Values a circle had before it was highlighted.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedHighlight {
    pub radius: f64,
    pub fill_opacity: Option<String>,
}

/// Group-only attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupData {
    /// True for annotation groups (box + polygon + keypoints).
    pub annotation: bool,
    pub uuid: Option<String>,
    pub class: String,
    /// Serialized role -> roles deletion rule map.
    pub deletion_rules: Option<String>,
    /// Free-form attributes carried into export.
    pub attributes: BTreeMap<String, String>,
    children: Vec<NodeId>,
}

impl GroupData {
    pub fn annotation(uuid: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            annotation: true,
            uuid: Some(uuid.into()),
            class: class.into(),
            ..Default::default()
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Geometry of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        base_radius: f64,
        saved: Option<SavedHighlight>,
    },
    Polygon {
        points: Vec<Point>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Group(GroupData),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rect { .. } => ShapeKind::Rect,
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Line { .. } => ShapeKind::Line,
            Shape::Group(_) => ShapeKind::Group,
        }
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub shape: Shape,
    /// Element identifier used by bindings.
    pub element_id: Option<String>,
    pub role: Option<Role>,
    pub label: Option<String>,
    /// Element identifier of the shape this one follows.
    pub bound_to: Option<String>,
    pub ignore_containment: bool,
    /// Role names this node's bounds constrain.
    pub contain: Vec<String>,
    pub style: Style,
    pub base_stroke_width: f64,
    pub stroke_width: f64,
    pub selected: bool,
    pub has_selected_child: bool,
    pub handle: Option<HandleTag>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            element_id: None,
            role: None,
            label: None,
            bound_to: None,
            ignore_containment: false,
            contain: Vec::new(),
            style: Style::default(),
            base_stroke_width: 0.0,
            stroke_width: 0.0,
            selected: false,
            has_selected_child: false,
            handle: None,
            parent: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Explicit role, or the kind's fallback role.
    pub fn role(&self) -> Role {
        self.role
            .clone()
            .unwrap_or_else(|| self.kind().default_role())
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role.as_ref() == Some(role)
    }

    /// Handles and cross indicators.
    pub fn is_transient(&self) -> bool {
        self.handle.is_some() || self.role.as_ref().is_some_and(Role::is_transient)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn group(&self) -> Option<&GroupData> {
        match &self.shape {
            Shape::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self) -> Option<&mut GroupData> {
        match &mut self.shape {
            Shape::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_annotation_group(&self) -> bool {
        self.group().is_some_and(|g| g.annotation)
    }

    /// Translates the node's own geometry. Groups have none.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::Rect { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Shape::Circle { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Shape::Polygon { points } => {
                for p in points.iter_mut() {
                    *p = p.translated(dx, dy);
                }
            }
            Shape::Line { x1, y1, x2, y2 } => {
                *x1 += dx;
                *y1 += dy;
                *x2 += dx;
                *y2 += dy;
            }
            Shape::Group(_) => {}
        }
    }

    /// Axis-aligned extent of the node's own geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        match &self.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => Some(Bounds::new(*x, *y, *width, *height)),
            Shape::Circle { cx, cy, r, .. } => Some(Bounds::new(cx - r, cy - r, r * 2.0, r * 2.0)),
            Shape::Polygon { points } => Bounds::from_points(points),
            Shape::Line { x1, y1, x2, y2 } => Some(Bounds::from_corners(
                x1.min(*x2),
                y1.min(*y2),
                x1.max(*x2),
                y1.max(*y2),
            )),
            Shape::Group(_) => None,
        }
    }

    /// Hit test against the node's own geometry.
    pub fn contains_point(&self, point: &Point, tolerance: f64) -> bool {
        match &self.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => Bounds::new(*x, *y, *width, *height).contains(point),
            Shape::Circle { cx, cy, r, .. } => point.distance_to(&Point::new(*cx, *cy)) <= *r,
            Shape::Polygon { points } => point_in_polygon(point, points),
            Shape::Line { x1, y1, x2, y2 } => {
                let reach = (self.stroke_width / 2.0).max(tolerance);
                distance_to_segment(point, &Point::new(*x1, *y1), &Point::new(*x2, *y2)) <= reach
            }
            Shape::Group(_) => false,
        }
    }
}

/// Owned arena of nodes with ordered root children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    root: Vec<NodeId>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<ShapeKind> {
        self.get(id).map(Node::kind)
    }

    /// Appends a node under `parent` (or the root). Returns its id.
    pub fn insert(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        self.insert_at(node, parent, None)
    }

    /// Inserts a node under `parent` at `index`, appending when `index` is
    /// `None` or past the end. A parent that is not a group falls back to
    /// the root.
    pub fn insert_at(&mut self, mut node: Node, parent: Option<NodeId>, index: Option<usize>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let parent = self.resolve_parent(parent);
        node.parent = parent;
        if let Some(group) = node.group_mut() {
            // Children are attached through the scene, never carried in.
            group.children.clear();
        }
        self.nodes.insert(id, node);
        self.attach(id, parent, index);
        id
    }

    /// Moves an existing node under `parent` at `index`.
    pub fn move_to(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) -> bool {
        if !self.contains(id) {
            return false;
        }
        let parent = self.resolve_parent(parent);
        if parent.is_some_and(|p| p == id || self.ancestors(p).contains(&id)) {
            tracing::warn!("Refusing to move {} under its own descendant", id);
            return false;
        }
        self.detach(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = parent;
        }
        self.attach(id, parent, index);
        true
    }

    /// Removes a node and its whole subtree. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if !self.contains(id) {
            return None;
        }
        self.detach(id);
        for descendant in self.descendants(id) {
            self.nodes.remove(&descendant);
        }
        self.nodes.remove(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Ordered children of `parent`, or of the root when `None`.
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.root,
            Some(id) => self
                .get(id)
                .and_then(Node::group)
                .map(GroupData::children)
                .unwrap_or(&[]),
        }
    }

    /// Position of a node within its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Ancestors from the parent up to the top-level node.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Every node below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(self.children(Some(id)), &mut out);
        out
    }

    /// Every node in the scene, depth first.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_subtree(&self.root, &mut out);
        out
    }

    /// `id` itself or its nearest ancestor that is an annotation group.
    pub fn closest_annotation_group(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.get(*n).is_some_and(Node::is_annotation_group))
    }

    /// First node in document order carrying this element identifier.
    pub fn find_by_element_id(&self, element_id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|id| self.get(*id).and_then(|n| n.element_id.as_deref()) == Some(element_id))
    }

    /// Annotation group with this UUID.
    pub fn find_by_uuid(&self, uuid: &str) -> Option<NodeId> {
        self.document_order().into_iter().find(|id| {
            self.get(*id)
                .and_then(Node::group)
                .and_then(|g| g.uuid.as_deref())
                == Some(uuid)
        })
    }

    /// Nodes whose bound-to reference names `element_id`.
    pub fn bound_to(&self, element_id: &str) -> Vec<NodeId> {
        self.filter_nodes(|n| n.bound_to.as_deref() == Some(element_id))
    }

    /// Nodes carrying a contain-rule list.
    pub fn containers(&self) -> Vec<NodeId> {
        self.filter_nodes(|n| !n.contain.is_empty())
    }

    pub fn annotation_groups(&self) -> Vec<NodeId> {
        self.filter_nodes(Node::is_annotation_group)
    }

    /// Handle and cross-indicator nodes.
    pub fn transient_nodes(&self) -> Vec<NodeId> {
        self.filter_nodes(Node::is_transient)
    }

    /// Top-most node under `point`.
    ///
    /// Handles win over shapes; cross indicators and groups are never hit.
    pub fn node_at(&self, point: &Point, tolerance: f64) -> Option<NodeId> {
        let order = self.document_order();
        let hit = |id: &&NodeId| self.get(**id).is_some_and(|n| n.contains_point(point, tolerance));

        order
            .iter()
            .rev()
            .filter(|id| self.get(**id).is_some_and(|n| n.handle.is_some()))
            .find(hit)
            .or_else(|| {
                order
                    .iter()
                    .rev()
                    .filter(|id| self.get(**id).is_some_and(|n| !n.is_transient()))
                    .find(hit)
            })
            .copied()
    }

    /// Geometry and identity of a node as carried in events.
    pub fn element_data(&self, id: NodeId) -> Option<ElementData> {
        let node = self.get(id)?;
        let element_id = node.element_id.clone().unwrap_or_default();
        let role = node.role().as_str().to_string();
        Some(match &node.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => ElementData::Rect {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                id: element_id,
                role,
            },
            Shape::Circle { cx, cy, r, .. } => ElementData::Circle {
                cx: *cx,
                cy: *cy,
                r: *r,
                id: element_id,
                label: node.label.clone().unwrap_or_default(),
                role,
            },
            Shape::Polygon { points } => ElementData::Polygon {
                points: points.clone(),
                id: element_id,
                role,
            },
            Shape::Line { x1, y1, x2, y2 } => ElementData::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                id: element_id,
                role,
            },
            Shape::Group(group) => ElementData::Group {
                uuid: group.uuid.clone().unwrap_or_default(),
                class: group.class.clone(),
                child_count: group
                    .children
                    .iter()
                    .filter(|c| self.get(**c).is_some_and(|n| !n.is_transient()))
                    .count(),
            },
        })
    }

    /// Deep copy without selection decoration.
    ///
    /// Handles and cross indicators are dropped and every highlight is
    /// reverted, so a restored snapshot never shows a stale selection.
    pub fn snapshot(&self) -> Scene {
        let mut copy = self.clone();
        for id in copy.transient_nodes() {
            copy.remove(id);
        }
        for node in copy.nodes.values_mut() {
            if let Shape::Circle { r, saved, .. } = &mut node.shape {
                if let Some(saved) = saved.take() {
                    *r = saved.radius;
                    node.style.fill_opacity = saved.fill_opacity;
                }
            }
            if node.selected {
                node.style.dash_array = None;
            }
            node.selected = false;
            node.has_selected_child = false;
        }
        copy
    }

    fn filter_nodes(&self, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(&pred))
            .collect()
    }

    fn collect_subtree(&self, ids: &[NodeId], out: &mut Vec<NodeId>) {
        for id in ids {
            out.push(*id);
            self.collect_subtree(self.children(Some(*id)), out);
        }
    }

    fn resolve_parent(&self, parent: Option<NodeId>) -> Option<NodeId> {
        match parent {
            Some(p) if self.get(p).and_then(Node::group).is_some() => Some(p),
            Some(p) => {
                tracing::warn!("{} is not a group; attaching to the root", p);
                None
            }
            None => None,
        }
    }

    fn child_list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.root),
            Some(p) => self
                .nodes
                .get_mut(&p)
                .and_then(Node::group_mut)
                .map(|g| &mut g.children),
        }
    }

    fn attach(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) {
        if let Some(list) = self.child_list_mut(parent) {
            match index {
                Some(i) if i < list.len() => list.insert(i, id),
                _ => list.push(id),
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.parent(id);
        if let Some(list) = self.child_list_mut(parent) {
            list.retain(|c| *c != id);
        }
    }
}
