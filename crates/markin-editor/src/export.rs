//! Annotation export.
//!
//! Converts annotation groups into plain serializable records and optionally
//! normalizes their coordinates into the unit square by dividing by the
//! image (or canvas) width and height.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use markin_core::constants::EXPORT_FORMAT_VERSION;
use markin_core::geometry::{flatten_points, generate_uuid};
use markin_core::{ElementData, LookupError, NodeId, Point, Result, Role, ShapeKind};

use crate::annotator::Annotator;
use crate::scene::{Node, Scene, Shape};

const ANNOTATION_TYPE: &str = "annotation";
const ANNOTATIONS_TYPE: &str = "annotations";
const ELEMENT_TYPE: &str = "element";

fn is_false(value: &bool) -> bool {
    !*value
}

/// Bounding box of an exported annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboxRecord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
}

/// Polygon of an exported annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub points: Vec<Point>,
    pub id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
}

/// Named keypoint of an exported annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointRecord {
    pub name: String,
    pub id: String,
    pub point: [f64; 2],
    pub visible: bool,
}

/// Size the coordinates were divided by
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub normalized: bool,
    pub normalization_width: f64,
    pub normalization_height: f64,
}

/// One exported annotation group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub uuid: String,
    pub class: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BboxRecord>,
    /// Polygon points flattened to `[x1, y1, x2, y2, ...]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<PolygonRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<KeypointRecord>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub segmentation_normalized: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub keypoints_normalized: bool,
    /// Set on a single-annotation export that was normalized.
    #[serde(flatten)]
    pub normalization: Option<Normalization>,
}

impl AnnotationRecord {
    /// Divides every coordinate by `width` / `height` and marks each part.
    pub fn normalize(&mut self, width: f64, height: f64) {
        if let Some(bbox) = self.bbox.as_mut() {
            bbox.x /= width;
            bbox.y /= height;
            bbox.width /= width;
            bbox.height /= height;
            bbox.normalized = true;
        }
        if let Some(polygon) = self.polygon.as_mut() {
            for p in polygon.points.iter_mut() {
                p.x /= width;
                p.y /= height;
            }
            polygon.normalized = true;
        }
        if let Some(segmentation) = self.segmentation.as_mut() {
            for pair in segmentation.chunks_exact_mut(2) {
                pair[0] /= width;
                pair[1] /= height;
            }
            self.segmentation_normalized = true;
        }
        if let Some(keypoints) = self.keypoints.as_mut() {
            for keypoint in keypoints.iter_mut() {
                keypoint.point[0] /= width;
                keypoint.point[1] /= height;
            }
            self.keypoints_normalized = true;
        }
    }
}

/// Every annotation in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationsDocument {
    #[serde(rename = "type")]
    pub record_type: String,
    pub version: String,
    pub count: usize,
    pub annotations: Vec<AnnotationRecord>,
    #[serde(flatten)]
    pub normalization: Option<Normalization>,
}

/// A selected node that is not inside an annotation group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: ElementData,
}

/// Result of exporting the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectedExport {
    Annotation(AnnotationRecord),
    Element(ElementRecord),
}

/// Export options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub normalize: bool,
    /// Normalization width; falls back to the viewport's canvas width.
    pub width: Option<f64>,
    /// Normalization height; falls back to the viewport's canvas height.
    pub height: Option<f64>,
}

impl ExportOptions {
    pub fn normalized(width: f64, height: f64) -> Self {
        Self {
            normalize: true,
            width: Some(width),
            height: Some(height),
        }
    }
}

/// Builds the export record of an annotation group.
pub fn export_annotation(scene: &Scene, group: NodeId) -> Result<AnnotationRecord> {
    let Some(node) = scene.get(group) else {
        tracing::error!("Cannot export {}: not in scene", group);
        return Err(LookupError::NodeNotFound { node: group }.into());
    };
    let Some(data) = node.group() else {
        tracing::error!("Invalid annotation group provided: {}", group);
        return Err(LookupError::NotAnAnnotationGroup { node: group }.into());
    };

    let parts: Vec<&Node> = scene
        .descendants(group)
        .into_iter()
        .filter_map(|d| scene.get(d))
        .collect();

    let bbox = parts
        .iter()
        .filter(|n| n.has_role(&Role::Bbox))
        .find_map(|n| match n.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => Some(BboxRecord {
                x,
                y,
                width,
                height,
                id: n.element_id.clone().unwrap_or_default(),
                normalized: false,
            }),
            _ => None,
        });

    let polygon = parts
        .iter()
        .filter(|n| n.has_role(&Role::Polygon))
        .find_map(|n| match &n.shape {
            Shape::Polygon { points } => Some(PolygonRecord {
                points: points.clone(),
                id: n.element_id.clone().unwrap_or_default(),
                normalized: false,
            }),
            _ => None,
        });

    let keypoints: Vec<KeypointRecord> = parts
        .iter()
        .filter(|n| n.has_role(&Role::Keypoint))
        .filter_map(|n| match n.shape {
            Shape::Circle { cx, cy, .. } => Some(KeypointRecord {
                name: n.label.clone().unwrap_or_default(),
                id: n.element_id.clone().unwrap_or_default(),
                point: [cx, cy],
                visible: true,
            }),
            _ => None,
        })
        .collect();

    let mut attributes = data.attributes.clone();
    if let Some(id) = node.element_id.as_ref() {
        attributes.insert("id".to_string(), id.clone());
    }

    Ok(AnnotationRecord {
        uuid: data.uuid.clone().unwrap_or_else(generate_uuid),
        class: data.class.clone(),
        record_type: ANNOTATION_TYPE.to_string(),
        bbox,
        segmentation: polygon.as_ref().map(|p| flatten_points(&p.points)),
        polygon,
        keypoints: (!keypoints.is_empty()).then_some(keypoints),
        attributes,
        segmentation_normalized: false,
        keypoints_normalized: false,
        normalization: None,
    })
}

impl Annotator {
    pub fn export_annotation(&self, group: NodeId) -> Result<AnnotationRecord> {
        export_annotation(self.scene(), group)
    }

    /// Exports every annotation group in document order.
    pub fn export_all_annotations(&self, options: &ExportOptions) -> AnnotationsDocument {
        let mut annotations: Vec<AnnotationRecord> = self
            .scene()
            .annotation_groups()
            .into_iter()
            .filter_map(|group| export_annotation(self.scene(), group).ok())
            .collect();

        let normalization = self.normalization_size(options).map(|(width, height)| {
            for annotation in annotations.iter_mut() {
                annotation.normalize(width, height);
            }
            Normalization {
                normalized: true,
                normalization_width: width,
                normalization_height: height,
            }
        });

        AnnotationsDocument {
            record_type: ANNOTATIONS_TYPE.to_string(),
            version: EXPORT_FORMAT_VERSION.to_string(),
            count: annotations.len(),
            annotations,
            normalization,
        }
    }

    /// Exports the selected annotation.
    ///
    /// A selected group exports itself, a selected part exports its
    /// enclosing annotation, and anything else exports its element data.
    pub fn export_selected_annotation(&self, options: &ExportOptions) -> Option<SelectedExport> {
        let Some(selected) = self.selected() else {
            tracing::warn!("No annotation selected");
            return None;
        };

        let group = match self.scene().kind(selected) {
            Some(ShapeKind::Group) => Some(selected),
            _ => self.scene().closest_annotation_group(selected),
        };
        let Some(group) = group else {
            let data = self.scene().element_data(selected)?;
            return Some(SelectedExport::Element(ElementRecord {
                record_type: ELEMENT_TYPE.to_string(),
                data,
            }));
        };

        let mut record = export_annotation(self.scene(), group).ok()?;
        if let Some((width, height)) = self.normalization_size(options) {
            record.normalize(width, height);
            record.normalization = Some(Normalization {
                normalized: true,
                normalization_width: width,
                normalization_height: height,
            });
        }
        Some(SelectedExport::Annotation(record))
    }

    /// All annotations as pretty-printed JSON.
    pub fn annotations_json(&self, options: &ExportOptions) -> Result<String> {
        Ok(serde_json::to_string_pretty(
            &self.export_all_annotations(options),
        )?)
    }

    /// The selected annotation as pretty-printed JSON, `None` without a
    /// selection.
    pub fn selected_annotation_json(&self, options: &ExportOptions) -> Result<Option<String>> {
        self.export_selected_annotation(options)
            .map(|export| serde_json::to_string_pretty(&export))
            .transpose()
            .map_err(Into::into)
    }

    /// Width and height to normalize by, when normalization was asked for
    /// and a usable size is known.
    fn normalization_size(&self, options: &ExportOptions) -> Option<(f64, f64)> {
        if !options.normalize {
            return None;
        }
        let width = options.width.or(self.viewport().canvas_width());
        let height = options.height.or(self.viewport().canvas_height());
        match (width, height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w, h)),
            _ => {
                tracing::warn!("Cannot normalize coordinates: image dimensions not available");
                None
            }
        }
    }
}
