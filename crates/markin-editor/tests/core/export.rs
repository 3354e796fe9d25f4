use std::collections::BTreeMap;

use markin_editor::{
    AnnotationOptions, Annotator, AnnotatorOptions, ExportOptions, Key, KeyInput, KeypointSpec,
    SelectedExport,
};

#[test]
fn test_nudged_bbox_exports_new_position() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(AnnotationOptions {
        x: Some(10.0),
        y: Some(10.0),
        width: Some(100.0),
        height: Some(50.0),
        require_bbox: Some(true),
        ..Default::default()
    });
    let bbox = annotator
        .scene()
        .document_order()
        .into_iter()
        .find(|id| {
            annotator
                .scene()
                .get(*id)
                .and_then(|n| n.element_id.as_deref())
                .is_some_and(|e| e.starts_with("bbox-"))
        })
        .unwrap();
    annotator.select(bbox);

    assert!(annotator.key_down(&KeyInput::new(Key::ArrowRight)));

    let document = annotator.export_all_annotations(&ExportOptions::default());
    let exported = document.annotations[0].bbox.as_ref().unwrap();
    assert_eq!(
        (exported.x, exported.y, exported.width, exported.height),
        (11.0, 10.0, 100.0, 50.0)
    );
}

#[test]
fn test_attributes_and_group_id_are_exported() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let mut attributes = BTreeMap::new();
    attributes.insert("occluded".to_string(), "true".to_string());
    let group = annotator.create_annotation(AnnotationOptions {
        uuid: Some("a".to_string()),
        id: Some("car-7".to_string()),
        class: Some("car".to_string()),
        attributes,
        ..Default::default()
    });

    let record = annotator.export_annotation(group).unwrap();
    assert_eq!(record.attributes.get("occluded").map(String::as_str), Some("true"));
    assert_eq!(record.attributes.get("id").map(String::as_str), Some("car-7"));
    assert!(record.bbox.is_none());
    assert!(record.keypoints.is_none());
}

#[test]
fn test_viewport_canvas_size_is_normalization_fallback() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("v".to_string()),
        bbox: Some([50.0, 25.0, 150.0, 75.0]),
        ..Default::default()
    });
    annotator.viewport_mut().set_canvas_size(500.0, 250.0);

    let options = ExportOptions {
        normalize: true,
        ..Default::default()
    };
    let document = annotator.export_all_annotations(&options);
    let bbox = document.annotations[0].bbox.as_ref().unwrap();
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0.1, 0.1, 0.2, 0.2));
    assert_eq!(
        document.normalization.map(|n| n.normalization_width),
        Some(500.0)
    );
}

#[test]
fn test_selected_export_is_normalized_with_marker() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("s".to_string()),
        keypoints: vec![KeypointSpec {
            name: Some("p".to_string()),
            point: vec![20.0, 30.0],
        }],
        ..Default::default()
    });

    let json = annotator
        .selected_annotation_json(&ExportOptions::normalized(100.0, 100.0))
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["uuid"], "s");
    assert_eq!(value["normalized"], true);
    assert_eq!(value["keypoints_normalized"], true);
    assert_eq!(value["keypoints"][0]["point"][0], 0.2);

    let parsed: SelectedExport = serde_json::from_str(&json).unwrap();
    assert!(matches!(parsed, SelectedExport::Annotation(_)));
}

#[test]
fn test_document_counts_remaining_annotations() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let first = annotator.create_annotation(AnnotationOptions {
        bbox: Some([0.0, 0.0, 10.0, 10.0]),
        ..Default::default()
    });
    annotator.create_annotation(AnnotationOptions {
        bbox: Some([20.0, 20.0, 30.0, 30.0]),
        ..Default::default()
    });
    annotator.delete_group(first).unwrap();

    let json = annotator.annotations_json(&ExportOptions::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "annotations");
    assert_eq!(value["count"], 1);
    assert_eq!(value["annotations"][0]["bbox"]["x"], 20.0);
}
