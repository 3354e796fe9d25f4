use std::sync::{Arc, Mutex};

use markin_core::event_bus::{AnnotatorEvent, ModificationEvent};
use markin_core::{EventFilter, HandleType, NodeId, Point};
use markin_editor::{
    AnnotationOptions, Annotator, AnnotatorOptions, Key, KeyInput, KeypointSpec, Shape,
};

fn annotator_with_polygon() -> (Annotator, NodeId) {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("kb".to_string()),
        bbox: Some([0.0, 0.0, 200.0, 200.0]),
        segmentation: Some(vec![50.0, 50.0, 100.0, 50.0, 100.0, 100.0]),
        keypoints: vec![KeypointSpec {
            name: Some("k".to_string()),
            point: vec![80.0, 80.0],
        }],
        ..Default::default()
    });
    let bbox = annotator.lookup("bbox-kb").unwrap();
    annotator.select(bbox);
    (annotator, bbox)
}

fn x_of(annotator: &Annotator, node: NodeId) -> f64 {
    match &annotator.scene().get(node).unwrap().shape {
        Shape::Rect { x, .. } => *x,
        Shape::Circle { cx, .. } => *cx,
        Shape::Polygon { points } => points[0].x,
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn test_nudge_step_sizes() {
    let (mut annotator, bbox) = annotator_with_polygon();

    annotator.key_down(&KeyInput::new(Key::ArrowRight));
    assert_eq!(x_of(&annotator, bbox), 1.0);
    annotator.key_down(&KeyInput::new(Key::ArrowRight).with_shift());
    assert_eq!(x_of(&annotator, bbox), 11.0);
    annotator.key_down(&KeyInput::new(Key::ArrowLeft).with_ctrl());
    assert!((x_of(&annotator, bbox) - 10.8).abs() < 1e-9);

    let meta = KeyInput {
        meta: true,
        ..KeyInput::new(Key::ArrowDown)
    };
    annotator.key_down(&meta);
    let bounds = annotator.scene().get(bbox).unwrap().bounds().unwrap();
    assert!((bounds.y - 0.2).abs() < 1e-9);
}

#[test]
fn test_polygon_nudge_leaves_bbox_followers() {
    let (mut annotator, _) = annotator_with_polygon();
    let polygon = annotator.lookup("polygon-kb").unwrap();
    let keypoint = annotator.lookup("keypoint-k-kb").unwrap();
    annotator.select(polygon);

    annotator.key_down(&KeyInput::new(Key::ArrowUp).with_shift());

    match &annotator.scene().get(polygon).unwrap().shape {
        Shape::Polygon { points } => assert_eq!(points[0], Point::new(50.0, 40.0)),
        other => panic!("unexpected shape {:?}", other),
    }
    assert_eq!(x_of(&annotator, keypoint), 80.0);
}

#[test]
fn test_nudge_reports_keyboard_completion() {
    let (mut annotator, bbox) = annotator_with_polygon();
    let handles = Arc::new(Mutex::new(Vec::new()));
    let sink = handles.clone();
    annotator.events().subscribe(
        EventFilter::topic("annotationmodificationcomplete"),
        move |event| {
            if let AnnotatorEvent::Modification(
                ModificationEvent::AnnotationModificationComplete { node, handle_type, .. },
            ) = event
            {
                sink.lock().unwrap().push((node, handle_type));
            }
        },
    );

    annotator.key_down(&KeyInput::new(Key::ArrowDown));

    assert_eq!(
        handles.lock().unwrap().as_slice(),
        &[(Some(bbox), Some(HandleType::Keyboard))]
    );
}

#[test]
fn test_undo_and_redo_shortcuts() {
    let (mut annotator, _) = annotator_with_polygon();
    annotator.key_down(&KeyInput::new(Key::ArrowRight));

    assert!(annotator.key_down(&KeyInput::new(Key::Char('z')).with_ctrl()));
    let bbox = annotator.lookup("bbox-kb").unwrap();
    assert_eq!(x_of(&annotator, bbox), 0.0);

    let redo = KeyInput::new(Key::Char('Z')).with_ctrl().with_shift();
    assert!(annotator.key_down(&redo));
    assert_eq!(x_of(&annotator, bbox), 1.0);
}

#[test]
fn test_keys_ignored_when_controls_disabled() {
    let (mut annotator, bbox) = annotator_with_polygon();
    annotator.disable_keyboard_controls();

    assert!(!annotator.key_down(&KeyInput::new(Key::ArrowRight)));
    assert!(!annotator.key_down(&KeyInput::new(Key::Delete)));
    assert_eq!(x_of(&annotator, bbox), 0.0);
    assert!(annotator.scene().contains(bbox));

    annotator.enable_keyboard_controls();
    assert!(annotator.key_down(&KeyInput::new(Key::ArrowRight)));
    assert_eq!(x_of(&annotator, bbox), 1.0);
}

#[test]
fn test_arrows_need_a_selection() {
    let (mut annotator, bbox) = annotator_with_polygon();
    annotator.deselect();

    assert!(!annotator.key_down(&KeyInput::new(Key::ArrowRight)));
    assert!(!annotator.key_down(&KeyInput::new(Key::Char('a'))));
    assert_eq!(x_of(&annotator, bbox), 0.0);
}

#[test]
fn test_delete_key_removes_selection() {
    let (mut annotator, _) = annotator_with_polygon();
    let keypoint = annotator.lookup("keypoint-k-kb").unwrap();
    annotator.select(keypoint);

    assert!(annotator.key_down(&KeyInput::new(Key::Backspace)));

    assert!(!annotator.scene().contains(keypoint));
    assert_eq!(annotator.selected(), None);
    assert!(annotator.handles().indicator().is_none());
    assert!(annotator.lookup("bbox-kb").is_some());
}

#[test]
fn test_disabled_annotator_ignores_keys() {
    let (mut annotator, bbox) = annotator_with_polygon();
    annotator.disable();
    assert!(!annotator.key_down(&KeyInput::new(Key::Char('z')).with_ctrl()));
    assert!(annotator.scene().contains(bbox));
}
