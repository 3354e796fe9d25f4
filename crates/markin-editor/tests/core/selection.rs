use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use markin_core::{EventFilter, NodeId, Point};
use markin_editor::{
    AnnotationOptions, Annotator, AnnotatorOptions, KeypointSpec, SelectionManager, Shape,
};

fn annotator_with_keypoint() -> (Annotator, NodeId, NodeId) {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let group = annotator.create_annotation(AnnotationOptions {
        uuid: Some("s1".to_string()),
        bbox: Some([0.0, 0.0, 100.0, 100.0]),
        keypoints: vec![KeypointSpec {
            name: Some("nose".to_string()),
            point: vec![50.0, 50.0],
        }],
        ..Default::default()
    });
    let keypoint = annotator.lookup("keypoint-nose-s1").unwrap();
    annotator.deselect();
    (annotator, group, keypoint)
}

fn radius(annotator: &Annotator, node: NodeId) -> f64 {
    match annotator.scene().get(node).unwrap().shape {
        Shape::Circle { r, .. } => r,
        ref other => panic!("not a circle: {:?}", other),
    }
}

#[test]
fn test_circle_highlight_round_trip() {
    let (mut annotator, _, keypoint) = annotator_with_keypoint();
    let before = annotator.scene().get(keypoint).unwrap().clone();

    annotator.select(keypoint);
    assert_eq!(radius(&annotator, keypoint), 15.0);
    assert_eq!(
        annotator.scene().get(keypoint).unwrap().style.fill_opacity.as_deref(),
        Some("0.05")
    );
    assert!(annotator.handles().indicator().is_some());

    annotator.deselect();
    let after = annotator.scene().get(keypoint).unwrap();
    assert_eq!(after.shape, before.shape);
    assert_eq!(after.style.fill_opacity, before.style.fill_opacity);
    assert!(annotator.handles().indicator().is_none());
}

#[test]
fn test_reselecting_circle_keeps_original_radius() {
    let (mut annotator, _, keypoint) = annotator_with_keypoint();
    annotator.select(keypoint);
    annotator.select(keypoint);
    assert_eq!(radius(&annotator, keypoint), 15.0);

    annotator.deselect();
    assert_eq!(radius(&annotator, keypoint), 5.0);
}

#[test]
fn test_group_selection_dashes_bbox_only() {
    let (mut annotator, group, _) = annotator_with_keypoint();
    let bbox = annotator.lookup("bbox-s1").unwrap();

    annotator.select(group);
    let g = annotator.scene().get(group).unwrap();
    assert!(g.has_selected_child);
    assert!(!g.selected);
    assert_eq!(g.style.dash_array, None);
    assert_eq!(
        annotator.scene().get(bbox).unwrap().style.dash_array.as_deref(),
        Some("5,5")
    );
    assert_eq!(annotator.handles().handles().len(), 4);

    annotator.deselect();
    assert_eq!(annotator.scene().get(bbox).unwrap().style.dash_array, None);
    assert!(annotator.handles().handles().is_empty());
}

#[test]
fn test_handles_are_not_selectable() {
    let (mut annotator, group, _) = annotator_with_keypoint();
    annotator.select(group);
    let handle = annotator.handles().handles()[0];
    assert!(!SelectionManager::is_selectable(annotator.scene(), handle));
    assert_eq!(
        SelectionManager::find_selectable_element(annotator.scene(), group),
        Some(group)
    );
}

#[test]
fn test_click_selects_shape_under_pointer() {
    let (mut annotator, _, keypoint) = annotator_with_keypoint();
    let bbox = annotator.lookup("bbox-s1").unwrap();

    annotator.click(Point::new(50.0, 50.0));
    assert_eq!(annotator.selected(), Some(keypoint));

    annotator.click(Point::new(10.0, 90.0));
    assert_eq!(annotator.selected(), Some(bbox));
}

#[test]
fn test_click_on_empty_canvas_deselects_once() {
    let (mut annotator, group, _) = annotator_with_keypoint();
    let clicks = Arc::new(AtomicUsize::new(0));
    let seen = clicks.clone();
    annotator
        .events()
        .subscribe(EventFilter::topic("canvasclick"), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

    annotator.select(group);
    annotator.click(Point::new(500.0, 500.0));
    assert_eq!(annotator.selected(), None);
    annotator.click(Point::new(500.0, 500.0));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_click_respects_viewport() {
    let (mut annotator, _, keypoint) = annotator_with_keypoint();
    annotator.viewport_mut().set_scale(2.0, 2.0);
    annotator.viewport_mut().set_pan(10.0, 10.0);

    annotator.click(Point::new(110.0, 110.0));
    assert_eq!(annotator.selected(), Some(keypoint));
}
