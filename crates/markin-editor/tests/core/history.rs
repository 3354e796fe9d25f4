use markin_editor::{
    AnnotationOptions, Annotator, AnnotatorOptions, HistoryManager, Key, KeyInput, Scene,
};

fn bbox_annotation(uuid: &str) -> AnnotationOptions {
    AnnotationOptions {
        uuid: Some(uuid.to_string()),
        bbox: Some([10.0, 10.0, 60.0, 60.0]),
        ..Default::default()
    }
}

fn bbox_x(annotator: &Annotator, uuid: &str) -> f64 {
    let bbox = annotator.lookup(&format!("bbox-{}", uuid)).unwrap();
    annotator.scene().get(bbox).unwrap().bounds().unwrap().x
}

#[test]
fn test_undo_redo_restores_scenes() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let empty = annotator.scene().snapshot();

    annotator.create_annotation(bbox_annotation("h"));
    let created = annotator.scene().snapshot();

    assert!(annotator.undo());
    assert_eq!(annotator.scene(), &empty);
    assert!(annotator.lookup("h").is_none());
    assert_eq!(annotator.selected(), None);

    assert!(annotator.redo());
    assert_eq!(annotator.scene(), &created);
    assert!(annotator.lookup("bbox-h").is_some());
    assert!(!annotator.redo());
}

#[test]
fn test_undo_reverts_nudge() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(bbox_annotation("n"));
    annotator.select(annotator.lookup("bbox-n").unwrap());

    annotator.key_down(&KeyInput::new(Key::ArrowLeft).with_shift());
    assert_eq!(bbox_x(&annotator, "n"), 0.0);
    assert_eq!(
        annotator.history().unwrap().current().map(|e| e.label.as_str()),
        Some("keyboard_move_rect")
    );

    annotator.undo();
    assert_eq!(bbox_x(&annotator, "n"), 10.0);
    assert!(annotator.can_redo());
}

#[test]
fn test_new_action_clears_redo() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(bbox_annotation("a"));
    annotator.undo();
    assert!(annotator.can_redo());

    annotator.create_annotation(bbox_annotation("b"));
    assert!(!annotator.can_redo());
    assert_eq!(
        annotator.history().unwrap().labels(),
        vec!["initial", "create_annotation"]
    );
}

#[test]
fn test_capacity_evicts_oldest() {
    let options = AnnotatorOptions {
        history_max_states: 3,
        ..Default::default()
    };
    let mut annotator = Annotator::new(options).unwrap();
    annotator.create_annotation(bbox_annotation("c"));
    annotator.select(annotator.lookup("bbox-c").unwrap());
    for _ in 0..4 {
        annotator.key_down(&KeyInput::new(Key::ArrowRight));
    }

    let history = annotator.history().unwrap();
    assert_eq!(history.undo_depth(), 3);
    assert!(!history.labels().contains(&"initial"));

    assert!(annotator.undo());
    assert!(annotator.undo());
    assert!(!annotator.undo());
    assert_eq!(bbox_x(&annotator, "c"), 12.0);
}

#[test]
fn test_clear_history_keeps_scene() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(bbox_annotation("k"));

    annotator.clear_history();

    assert_eq!(annotator.history().unwrap().labels(), vec!["initial"]);
    assert!(!annotator.can_undo());
    assert!(annotator.lookup("bbox-k").is_some());
}

#[test]
fn test_snapshots_drop_selection_decoration() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(bbox_annotation("d"));
    assert!(!annotator.handles().handles().is_empty());

    let entry = annotator.history().unwrap().current().unwrap();
    let scene: &Scene = entry.scene();
    assert!(scene.transient_nodes().is_empty());
    assert!(scene.document_order().iter().all(|id| {
        let node = scene.get(*id).unwrap();
        !node.selected && node.style.dash_array.is_none()
    }));
}

#[test]
fn test_manager_minimum_capacity() {
    let mut history = HistoryManager::new(0);
    assert_eq!(history.max_states(), 1);

    let scene = Scene::new();
    history.save_state(&scene, "one");
    history.save_state(&scene, "two");
    assert_eq!(history.labels(), vec!["two"]);
    assert!(history.undo().is_none());
}
