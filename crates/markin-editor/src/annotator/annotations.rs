//! Annotation lifecycle: create, rebuild in place, add keypoints.
//!
//! An annotation is a group carrying a UUID and class label, holding an
//! optional bbox rectangle, an optional polygon and any number of keypoint
//! circles. Polygon and keypoints follow the bbox through a binding when
//! binding is on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use markin_core::constants::DEFAULT_BASE_RADIUS;
use markin_core::event_bus::{AnnotatorEvent, LifecycleEvent, ModificationData, ModificationEvent};
use markin_core::geometry::{generate_uuid, points_from_flat};
use markin_core::{LookupError, ModificationKind, NodeId, Point, Result, Role, ShapeKind};

use super::Annotator;
use crate::config::DeletionRules;
use crate::scene::{GroupData, Node, Style};

const DEFAULT_FILL: &str = "rgba(0, 0, 255, 0.2)";
const DEFAULT_STROKE: &str = "#0000FF";
const KEYPOINT_FILL: &str = "#FFFFFF";
const SHAPE_FILL_OPACITY: &str = "0.3";
const KEYPOINT_FILL_OPACITY: &str = "0.7";
const STROKE_OPACITY: &str = "0.8";

/// One keypoint of a new annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointSpec {
    /// Defaults to `keypoint-<index>`.
    pub name: Option<String>,
    /// `[x, y]`; entries of any other length are skipped.
    pub point: Vec<f64>,
}

/// Options for [`Annotator::create_annotation`].
///
/// Unset toggles fall back to the annotator's options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationOptions {
    pub uuid: Option<String>,
    /// Element id of the group.
    pub id: Option<String>,
    pub class: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Explicit `[xmin, ymin, xmax, ymax]` box; always creates a bbox.
    pub bbox: Option<[f64; 4]>,
    /// Flat `[x1, y1, x2, y2, ...]` polygon, at least three points.
    pub segmentation: Option<Vec<f64>>,
    pub keypoints: Vec<KeypointSpec>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub require_bbox: Option<bool>,
    pub bbox_contain_polygon: Option<bool>,
    pub bbox_contain_keypoints: Option<bool>,
    pub bind_elements: Option<bool>,
    /// Roles the bbox contains, replacing the `polygon,keypoint` default.
    pub contain_rules: Vec<String>,
    pub deletion_rules: Option<DeletionRules>,
    /// Custom attributes carried on the group and through export.
    pub attributes: BTreeMap<String, String>,
}

/// Styling and binding for [`Annotator::add_keypoint`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointOptions {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub fill_opacity: Option<String>,
    pub stroke_opacity: Option<String>,
    pub bind_element: Option<bool>,
}

/// How [`Annotator::update_annotation`] finds the group to rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLookup {
    /// The group itself or any node inside it.
    Node(NodeId),
    /// Element id of the group or of any node inside it.
    Id(String),
    Uuid(String),
}

impl std::fmt::Display for AnnotationLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationLookup::Node(node) => write!(f, "node {}", node),
            AnnotationLookup::Id(id) => write!(f, "id {}", id),
            AnnotationLookup::Uuid(uuid) => write!(f, "uuid {}", uuid),
        }
    }
}

/// Where a rebuilt group goes.
struct Placement {
    parent: Option<NodeId>,
    index: Option<usize>,
}

impl Annotator {
    /// Creates an annotation group and selects it.
    ///
    /// Emits `annotationcreated` and saves `create_annotation`.
    pub fn create_annotation(&mut self, options: AnnotationOptions) -> NodeId {
        let uuid = options.uuid.clone().unwrap_or_else(generate_uuid);
        let group_id = options.id.clone();
        let group = self.build_annotation(
            &options,
            uuid,
            group_id,
            Placement {
                parent: None,
                index: None,
            },
        );
        self.save_state("create_annotation");
        group
    }

    /// Rebuilds an existing annotation from `options` in place.
    ///
    /// The UUID, the group's element id and its position among its siblings
    /// are kept. Emits `annotationupdated` and saves `update_annotation`.
    pub fn update_annotation(
        &mut self,
        lookup: AnnotationLookup,
        options: AnnotationOptions,
    ) -> Result<NodeId> {
        let Some(old_group) = self.resolve_annotation(&lookup) else {
            tracing::error!("No existing annotation found for {}", lookup);
            return Err(LookupError::AnnotationNotFound {
                query: lookup.to_string(),
            }
            .into());
        };

        let old = self.scene.get(old_group);
        let Some(uuid) = old.and_then(Node::group).and_then(|g| g.uuid.clone()) else {
            tracing::error!("Annotation group {} has no UUID", old_group);
            return Err(LookupError::MissingUuid { node: old_group }.into());
        };
        let group_id = old
            .and_then(|n| n.element_id.clone())
            .or_else(|| match &lookup {
                AnnotationLookup::Id(id) => Some(id.clone()),
                _ => None,
            })
            .or_else(|| options.id.clone());

        let placement = Placement {
            parent: self.scene.parent(old_group),
            index: self.scene.index_in_parent(old_group),
        };

        self.deselect();
        let mut gone = self.scene.descendants(old_group);
        gone.push(old_group);
        for id in gone {
            self.armed.remove(&id);
            self.unregister(id);
        }
        self.scene.remove(old_group);

        let group = self.build_annotation(&options, uuid.clone(), group_id.clone(), placement);
        self.save_state("update_annotation");

        tracing::info!("Updated annotation {}", uuid);
        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::AnnotationUpdated {
                uuid,
                id: group_id,
                group,
                old_group,
            }));
        Ok(group)
    }

    /// Adds a named keypoint to the annotation containing `target`, or the
    /// selection when `target` is `None`.
    ///
    /// The keypoint binds to the group's bbox when binding is on.
    pub fn add_keypoint(
        &mut self,
        target: Option<NodeId>,
        name: &str,
        x: f64,
        y: f64,
        options: KeypointOptions,
    ) -> Result<NodeId> {
        let Some(start) = target.or_else(|| self.selection.selected()) else {
            tracing::error!("No element selected and no element provided");
            return Err(LookupError::NoSelection.into());
        };
        let Some(group) = self.scene.closest_annotation_group(start) else {
            tracing::error!("Cannot find valid annotation group for {}", start);
            return Err(LookupError::NotAnAnnotationGroup { node: start }.into());
        };
        let Some(uuid) = self
            .scene
            .get(group)
            .and_then(Node::group)
            .and_then(|g| g.uuid.clone())
        else {
            tracing::error!("Annotation group {} missing UUID", group);
            return Err(LookupError::MissingUuid { node: group }.into());
        };

        let bind = options.bind_element.unwrap_or(self.options.bind_elements);
        let bbox_id = self
            .scene
            .descendants(group)
            .into_iter()
            .filter_map(|d| self.scene.get(d))
            .find(|n| n.kind() == ShapeKind::Rect && n.has_role(&Role::Bbox))
            .and_then(|n| n.element_id.clone());

        let style = Style {
            fill: Some(options.fill.unwrap_or_else(|| KEYPOINT_FILL.to_string())),
            stroke: Some(options.stroke.unwrap_or_else(|| DEFAULT_STROKE.to_string())),
            fill_opacity: Some(
                options
                    .fill_opacity
                    .unwrap_or_else(|| KEYPOINT_FILL_OPACITY.to_string()),
            ),
            stroke_opacity: Some(
                options
                    .stroke_opacity
                    .unwrap_or_else(|| STROKE_OPACITY.to_string()),
            ),
            class: Some("KeypointElement".to_string()),
            dash_array: None,
        };
        let mut circle = self.keypoint_node(name, &uuid, Point::new(x, y), style);
        match (bbox_id, bind) {
            (Some(bbox_id), true) => circle.bound_to = Some(bbox_id),
            (_, false) => circle.ignore_containment = true,
            (None, true) => {}
        }
        let element_id = circle.element_id.clone();

        let keypoint = self.scene.insert(circle, Some(group));
        self.armed.insert(keypoint);
        if let Some(element_id) = element_id {
            self.register(element_id, keypoint);
        }
        self.save_state("add_keypoint");

        tracing::info!("Added keypoint '{}' to {}", name, uuid);
        self.bus
            .emit(AnnotatorEvent::Modification(ModificationEvent::KeypointAdded {
                node: keypoint,
                name: name.to_string(),
                position: Point::new(x, y),
                group,
            }));
        self.bus.emit(AnnotatorEvent::Modification(
            ModificationEvent::AnnotationModificationComplete {
                node: Some(keypoint),
                kind: ShapeKind::Circle,
                modification: ModificationKind::AddKeypoint,
                handle_type: None,
                data: ModificationData::from(self.scene.element_data(keypoint)),
            },
        ));
        Ok(keypoint)
    }

    fn resolve_annotation(&self, lookup: &AnnotationLookup) -> Option<NodeId> {
        let start = match lookup {
            AnnotationLookup::Node(node) => Some(*node).filter(|n| self.scene.contains(*n)),
            AnnotationLookup::Id(id) => self.scene.find_by_element_id(id),
            AnnotationLookup::Uuid(uuid) => self.scene.find_by_uuid(uuid),
        }?;
        self.scene.closest_annotation_group(start)
    }

    fn keypoint_node(&self, name: &str, uuid: &str, at: Point, style: Style) -> Node {
        let mut circle = self
            .factory
            .create_circle(at.x, at.y, Some(DEFAULT_BASE_RADIUS))
            .with_role(Role::Keypoint)
            .with_element_id(format!("keypoint-{}-{}", name, uuid))
            .with_style(style);
        circle.label = Some(name.to_string());
        circle
    }

    /// Builds the group and its parts, selects it and emits
    /// `annotationcreated`. No history entry.
    fn build_annotation(
        &mut self,
        options: &AnnotationOptions,
        uuid: String,
        group_id: Option<String>,
        placement: Placement,
    ) -> NodeId {
        let class = options.class.clone().unwrap_or_default();
        let fill = options.fill.as_deref().unwrap_or(DEFAULT_FILL);
        let stroke = options.stroke.as_deref().unwrap_or(DEFAULT_STROKE);
        let require_bbox = options.require_bbox.unwrap_or(self.options.require_bbox);
        let bind = options.bind_elements.unwrap_or(self.options.bind_elements);
        let contain_polygon = options
            .bbox_contain_polygon
            .unwrap_or(self.options.bbox_contain_polygon);
        let contain_keypoints = options
            .bbox_contain_keypoints
            .unwrap_or(self.options.bbox_contain_keypoints);
        let rules = options
            .deletion_rules
            .as_ref()
            .unwrap_or(&self.options.deletion_rules);

        let mut data = GroupData::annotation(uuid.clone(), class.clone());
        data.deletion_rules = match serde_json::to_string(rules) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!("Dropping unserializable deletion rules: {}", e);
                None
            }
        };
        data.attributes = options.attributes.clone();
        let mut group_node = self.factory.create_group(data).with_role(Role::Group);
        group_node.element_id = group_id.clone();

        let group = self
            .scene
            .insert_at(group_node, placement.parent, placement.index);
        self.register(uuid.clone(), group);
        if let Some(id) = group_id {
            self.register(id, group);
        }

        let shape_style = |class: &str| Style {
            fill: Some(fill.to_string()),
            stroke: Some(stroke.to_string()),
            fill_opacity: Some(SHAPE_FILL_OPACITY.to_string()),
            stroke_opacity: Some(STROKE_OPACITY.to_string()),
            class: Some(class.to_string()),
            dash_array: None,
        };

        let mut bbox_id = None;
        if require_bbox || options.bbox.is_some() {
            let (x, y, width, height) = match options.bbox {
                Some([xmin, ymin, xmax, ymax]) => (xmin, ymin, xmax - xmin, ymax - ymin),
                None => (
                    options.x.unwrap_or(100.0),
                    options.y.unwrap_or(100.0),
                    options.width.unwrap_or(200.0),
                    options.height.unwrap_or(150.0),
                ),
            };
            let id = format!("bbox-{}", uuid);
            let mut rect = self
                .factory
                .create_rect(x, y, width, height)
                .with_role(Role::Bbox)
                .with_element_id(id.clone())
                .with_style(shape_style("BboxElement"));
            if bind && !options.contain_rules.is_empty() {
                rect.contain = options.contain_rules.clone();
            } else if bind && contain_polygon && contain_keypoints {
                rect.contain = vec!["polygon".to_string(), "keypoint".to_string()];
            }
            let node = self.scene.insert(rect, Some(group));
            self.register(id.clone(), node);
            bbox_id = Some(id);
        }

        let follow = |node: &mut Node| match (&bbox_id, bind) {
            (Some(id), true) => node.bound_to = Some(id.clone()),
            (_, false) => node.ignore_containment = true,
            (None, true) => {}
        };

        if let Some(flat) = options.segmentation.as_deref().filter(|s| s.len() >= 6) {
            let id = format!("polygon-{}", uuid);
            let mut polygon = self
                .factory
                .create_polygon(points_from_flat(flat))
                .with_role(Role::Polygon)
                .with_element_id(id.clone())
                .with_style(shape_style("PolygonElement"));
            follow(&mut polygon);
            let node = self.scene.insert(polygon, Some(group));
            self.register(id, node);
        }

        for (index, spec) in options.keypoints.iter().enumerate() {
            let &[x, y] = spec.point.as_slice() else {
                tracing::debug!("Skipping keypoint {} without a 2D point", index);
                continue;
            };
            let name = spec
                .name
                .clone()
                .unwrap_or_else(|| format!("keypoint-{}", index));
            let style = Style {
                fill: Some(KEYPOINT_FILL.to_string()),
                stroke: Some(stroke.to_string()),
                fill_opacity: Some(KEYPOINT_FILL_OPACITY.to_string()),
                stroke_opacity: Some(STROKE_OPACITY.to_string()),
                class: Some("KeypointElement".to_string()),
                dash_array: None,
            };
            let mut circle = self.keypoint_node(&name, &uuid, Point::new(x, y), style);
            follow(&mut circle);
            let id = circle.element_id.clone();
            let node = self.scene.insert(circle, Some(group));
            self.armed.insert(node);
            if let Some(id) = id {
                self.register(id, node);
            }
        }

        self.select(group);

        tracing::info!("Created annotation {} ({})", uuid, class);
        self.bus
            .emit(AnnotatorEvent::Lifecycle(LifecycleEvent::AnnotationCreated {
                group,
                uuid,
                class,
            }));
        group
    }
}
