use markin_core::{NodeId, Point};
use markin_editor::{
    AnnotationOptions, Annotator, AnnotatorOptions, Key, KeyInput, KeypointSpec, Shape,
};

fn annotation(options: AnnotatorOptions) -> (Annotator, NodeId, NodeId, NodeId) {
    let mut annotator = Annotator::new(options).unwrap();
    let group = annotator.create_annotation(AnnotationOptions {
        uuid: Some("b".to_string()),
        bbox: Some([0.0, 0.0, 100.0, 100.0]),
        segmentation: Some(vec![10.0, 10.0, 40.0, 10.0, 40.0, 40.0]),
        keypoints: vec![KeypointSpec {
            name: Some("tip".to_string()),
            point: vec![50.0, 50.0],
        }],
        ..Default::default()
    });
    let bbox = annotator.lookup("bbox-b").unwrap();
    let keypoint = annotator.lookup("keypoint-tip-b").unwrap();
    (annotator, group, bbox, keypoint)
}

fn center(annotator: &Annotator, node: NodeId) -> (f64, f64) {
    match annotator.scene().get(node).unwrap().shape {
        Shape::Circle { cx, cy, .. } => (cx, cy),
        ref other => panic!("not a circle: {:?}", other),
    }
}

fn first_vertex(annotator: &Annotator) -> Point {
    let polygon = annotator.lookup("polygon-b").unwrap();
    match &annotator.scene().get(polygon).unwrap().shape {
        Shape::Polygon { points } => points[0],
        other => panic!("not a polygon: {:?}", other),
    }
}

#[test]
fn test_parts_bind_to_bbox() {
    let (annotator, _, _, keypoint) = annotation(AnnotatorOptions::default());
    let polygon = annotator.lookup("polygon-b").unwrap();

    assert_eq!(
        annotator.scene().get(keypoint).unwrap().bound_to.as_deref(),
        Some("bbox-b")
    );
    assert_eq!(
        annotator.scene().get(polygon).unwrap().bound_to.as_deref(),
        Some("bbox-b")
    );
    assert_eq!(annotator.scene().bound_to("bbox-b").len(), 2);
}

#[test]
fn test_resize_keeps_relative_position() {
    let (mut annotator, _, _, keypoint) = annotation(AnnotatorOptions::default());

    // The new group is selected, so the bbox corner handles are live.
    assert!(annotator.pointer_down(Point::new(100.0, 100.0)));
    annotator.pointer_move(Point::new(200.0, 150.0));
    annotator.pointer_up(Point::new(200.0, 150.0));

    assert_eq!(center(&annotator, keypoint), (100.0, 75.0));
    assert_eq!(first_vertex(&annotator), Point::new(20.0, 15.0));
}

#[test]
fn test_bbox_move_carries_followers() {
    let (mut annotator, _, bbox, keypoint) = annotation(AnnotatorOptions::default());

    annotator.click(Point::new(90.0, 90.0));
    assert_eq!(annotator.selected(), Some(bbox));
    assert!(annotator.pointer_down(Point::new(90.0, 90.0)));
    annotator.pointer_move(Point::new(100.0, 95.0));
    annotator.pointer_up(Point::new(100.0, 95.0));

    assert_eq!(center(&annotator, keypoint), (60.0, 55.0));
    assert_eq!(first_vertex(&annotator), Point::new(20.0, 15.0));
}

#[test]
fn test_group_nudge_moves_each_part_once() {
    let (mut annotator, group, bbox, keypoint) = annotation(AnnotatorOptions::default());
    annotator.select(group);

    annotator.key_down(&KeyInput::new(Key::ArrowDown));

    let bounds = annotator.scene().get(bbox).unwrap().bounds().unwrap();
    assert_eq!((bounds.x, bounds.y), (0.0, 1.0));
    assert_eq!(center(&annotator, keypoint), (50.0, 51.0));
    assert_eq!(first_vertex(&annotator), Point::new(10.0, 11.0));
}

#[test]
fn test_unbound_parts_stay_put() {
    let options = AnnotatorOptions {
        bind_elements: false,
        ..Default::default()
    };
    let (mut annotator, _, bbox, keypoint) = annotation(options);
    assert!(annotator.scene().get(bbox).unwrap().contain.is_empty());
    assert!(annotator.scene().get(keypoint).unwrap().ignore_containment);

    annotator.select(bbox);
    annotator.key_down(&KeyInput::new(Key::ArrowRight).with_shift());

    assert_eq!(center(&annotator, keypoint), (50.0, 50.0));
    assert_eq!(first_vertex(&annotator), Point::new(10.0, 10.0));
}

#[test]
fn test_keypoint_clamped_by_owner_bbox_only() {
    let (mut annotator, _, _, keypoint) = annotation(AnnotatorOptions::default());
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("other".to_string()),
        bbox: Some([300.0, 300.0, 320.0, 320.0]),
        ..Default::default()
    });

    annotator.select(keypoint);
    for _ in 0..4 {
        annotator.key_down(&KeyInput::new(Key::ArrowRight).with_shift());
    }

    let r = match annotator.scene().get(keypoint).unwrap().shape {
        Shape::Circle { r, .. } => r,
        _ => unreachable!(),
    };
    assert_eq!(center(&annotator, keypoint), (100.0 - r, 50.0));
}
