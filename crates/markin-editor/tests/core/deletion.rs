use std::collections::BTreeMap;

use markin_core::NodeId;
use markin_editor::{AnnotationOptions, Annotator, AnnotatorOptions, KeypointSpec};

fn full_annotation(annotator: &mut Annotator, uuid: &str) -> NodeId {
    let group = annotator.create_annotation(AnnotationOptions {
        uuid: Some(uuid.to_string()),
        bbox: Some([0.0, 0.0, 100.0, 100.0]),
        segmentation: Some(vec![10.0, 10.0, 40.0, 10.0, 40.0, 40.0]),
        keypoints: vec![
            KeypointSpec {
                name: Some("a".to_string()),
                point: vec![20.0, 20.0],
            },
            KeypointSpec {
                name: Some("b".to_string()),
                point: vec![60.0, 60.0],
            },
        ],
        ..Default::default()
    });
    annotator.deselect();
    group
}

fn content(annotator: &Annotator, group: NodeId) -> usize {
    let scene = annotator.scene();
    scene
        .children(Some(group))
        .iter()
        .filter(|c| scene.get(**c).is_some_and(|n| !n.is_transient()))
        .count()
}

#[test]
fn test_keypoint_delete_only_removes_itself() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let group = full_annotation(&mut annotator, "k");
    let keypoint = annotator.lookup("keypoint-a-k").unwrap();

    annotator.delete_element(keypoint).unwrap();

    assert!(!annotator.scene().contains(keypoint));
    assert_eq!(content(&annotator, group), 3);
    assert!(annotator.lookup("keypoint-a-k").is_none());
    assert!(annotator.lookup("keypoint-b-k").is_some());
}

#[test]
fn test_polygon_delete_takes_bbox_but_not_keypoints() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let group = full_annotation(&mut annotator, "p");
    let polygon = annotator.lookup("polygon-p").unwrap();

    annotator.delete_element(polygon).unwrap();

    assert!(annotator.lookup("bbox-p").is_none());
    assert!(annotator.scene().contains(group));
    assert_eq!(content(&annotator, group), 2);
}

#[test]
fn test_custom_rules_override_defaults() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let mut rules = BTreeMap::new();
    rules.insert("polygon".to_string(), Vec::new());
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("c".to_string()),
        bbox: Some([0.0, 0.0, 100.0, 100.0]),
        segmentation: Some(vec![10.0, 10.0, 40.0, 10.0, 40.0, 40.0]),
        deletion_rules: Some(rules),
        ..Default::default()
    });
    let polygon = annotator.lookup("polygon-c").unwrap();

    annotator.delete_element(polygon).unwrap();

    assert!(annotator.lookup("bbox-c").is_some());
}

#[test]
fn test_rules_change_affects_only_new_annotations() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    full_annotation(&mut annotator, "old");
    annotator.set_deletion_rules(BTreeMap::new());
    full_annotation(&mut annotator, "new");

    annotator
        .delete_element(annotator.lookup("polygon-old").unwrap())
        .unwrap();
    annotator
        .delete_element(annotator.lookup("polygon-new").unwrap())
        .unwrap();

    assert!(annotator.lookup("bbox-old").is_none());
    assert!(annotator.lookup("bbox-new").is_some());
}

#[test]
fn test_last_part_removes_group() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let group = annotator.create_annotation(AnnotationOptions {
        uuid: Some("solo".to_string()),
        keypoints: vec![KeypointSpec {
            name: Some("only".to_string()),
            point: vec![5.0, 5.0],
        }],
        ..Default::default()
    });

    annotator
        .delete_element(annotator.lookup("keypoint-only-solo").unwrap())
        .unwrap();

    assert!(!annotator.scene().contains(group));
    assert!(annotator.lookup("solo").is_none());
    assert!(annotator.scene().annotation_groups().is_empty());
}

#[test]
fn test_delete_group_leaves_other_annotations() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let first = full_annotation(&mut annotator, "g1");
    let second = full_annotation(&mut annotator, "g2");

    annotator.delete_group(first).unwrap();

    assert!(!annotator.scene().contains(first));
    assert!(annotator.scene().contains(second));
    assert_eq!(content(&annotator, second), 4);
    assert_eq!(
        annotator.history().unwrap().labels().last(),
        Some(&"delete_group")
    );
}

#[test]
fn test_delete_group_rejects_shapes() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    full_annotation(&mut annotator, "x");
    let bbox = annotator.lookup("bbox-x").unwrap();

    let err = annotator.delete_group(bbox).unwrap_err();
    assert!(err.is_lookup_error());
    assert!(annotator.scene().contains(bbox));
}

#[test]
fn test_delete_without_binding_never_cascades() {
    let options = AnnotatorOptions {
        bind_elements: false,
        ..Default::default()
    };
    let mut annotator = Annotator::new(options).unwrap();
    let group = full_annotation(&mut annotator, "n");

    annotator
        .delete_element(annotator.lookup("bbox-n").unwrap())
        .unwrap();

    assert_eq!(content(&annotator, group), 3);
}

#[test]
fn test_delete_missing_node_fails() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let group = full_annotation(&mut annotator, "m");
    annotator.delete_group(group).unwrap();

    assert!(annotator.delete_element(group).is_err());
}
