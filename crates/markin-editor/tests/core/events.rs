use std::sync::{Arc, Mutex};

use markin_core::event_bus::{AnnotatorEvent, LifecycleEvent, ModificationData, ModificationEvent};
use markin_core::{EventFilter, ModificationKind, Point, Role};
use markin_editor::{
    AnnotationLookup, AnnotationOptions, Annotator, AnnotatorOptions, KeypointOptions, KeypointSpec,
};

type Log = Arc<Mutex<Vec<AnnotatorEvent>>>;

fn record(annotator: &Annotator, filter: EventFilter) -> Log {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    annotator.events().subscribe(filter, move |event| {
        sink.lock().unwrap().push(event);
    });
    log
}

fn topics(log: &Log) -> Vec<&'static str> {
    log.lock().unwrap().iter().map(AnnotatorEvent::topic).collect()
}

fn annotator_with_annotation() -> Annotator {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    annotator.create_annotation(AnnotationOptions {
        uuid: Some("e".to_string()),
        id: Some("person-1".to_string()),
        class: Some("person".to_string()),
        bbox: Some([0.0, 0.0, 100.0, 100.0]),
        keypoints: vec![KeypointSpec {
            name: Some("hand".to_string()),
            point: vec![30.0, 30.0],
        }],
        ..Default::default()
    });
    annotator.deselect();
    annotator
}

#[test]
fn test_create_announces_annotation() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let log = record(&annotator, EventFilter::topic("annotationcreated"));

    annotator.create_annotation(AnnotationOptions {
        uuid: Some("new".to_string()),
        class: Some("car".to_string()),
        ..Default::default()
    });

    let events = log.lock().unwrap();
    match events.as_slice() {
        [AnnotatorEvent::Lifecycle(LifecycleEvent::AnnotationCreated { uuid, class, .. })] => {
            assert_eq!(uuid, "new");
            assert_eq!(class, "car");
        }
        other => panic!("unexpected events {:?}", other),
    }
}

#[test]
fn test_delete_event_sequence() {
    let mut annotator = annotator_with_annotation();
    let keypoint = annotator.lookup("keypoint-hand-e").unwrap();
    let log = record(&annotator, EventFilter::All);

    annotator.delete_element(keypoint).unwrap();

    assert_eq!(
        topics(&log),
        vec![
            "beforedelete",
            "delete",
            "annotationmodified",
            "annotationmodificationcomplete",
        ]
    );
    let events = log.lock().unwrap();
    match &events[1] {
        AnnotatorEvent::Lifecycle(LifecycleEvent::Deleted(info)) => {
            assert_eq!(info.role, Role::Keypoint);
            assert_eq!(info.group_id.as_deref(), Some("person-1"));
        }
        other => panic!("unexpected event {:?}", other),
    }
    match &events[2] {
        AnnotatorEvent::Modification(ModificationEvent::AnnotationModified {
            node,
            modification,
            data,
            ..
        }) => {
            assert_eq!(*node, None);
            assert_eq!(*modification, ModificationKind::Delete);
            assert!(matches!(data, ModificationData::Deleted(_)));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_group_delete_events() {
    let mut annotator = annotator_with_annotation();
    let group = annotator.lookup("e").unwrap();
    let log = record(&annotator, EventFilter::All);

    annotator.delete_element(group).unwrap();

    assert_eq!(
        topics(&log),
        vec![
            "beforedelete",
            "beforedeletegroup",
            "deletegroup",
            "delete",
            "annotationmodified",
            "annotationmodificationcomplete",
        ]
    );
}

#[test]
fn test_update_reports_identity() {
    let mut annotator = annotator_with_annotation();
    let log = record(&annotator, EventFilter::topic("annotationupdated"));

    annotator
        .update_annotation(
            AnnotationLookup::Uuid("e".to_string()),
            AnnotationOptions {
                uuid: Some("e".to_string()),
                class: Some("rider".to_string()),
                bbox: Some([5.0, 5.0, 50.0, 50.0]),
                ..Default::default()
            },
        )
        .unwrap();

    let events = log.lock().unwrap();
    match events.as_slice() {
        [AnnotatorEvent::Lifecycle(LifecycleEvent::AnnotationUpdated { uuid, id, .. })] => {
            assert_eq!(uuid, "e");
            assert_eq!(id.as_deref(), Some("person-1"));
        }
        other => panic!("unexpected events {:?}", other),
    }
}

#[test]
fn test_add_keypoint_events() {
    let mut annotator = annotator_with_annotation();
    let group = annotator.lookup("e").unwrap();
    let log = record(&annotator, EventFilter::All);

    annotator
        .add_keypoint(Some(group), "foot", 40.0, 90.0, KeypointOptions::default())
        .unwrap();

    assert_eq!(
        topics(&log),
        vec!["keypointadded", "annotationmodificationcomplete"]
    );
    let events = log.lock().unwrap();
    match &events[0] {
        AnnotatorEvent::Modification(ModificationEvent::KeypointAdded {
            name, position, ..
        }) => {
            assert_eq!(name, "foot");
            assert_eq!(*position, Point::new(40.0, 90.0));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_settings_events_only_on_change() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let log = record(&annotator, EventFilter::All);

    annotator.enable_keyboard_controls();
    annotator.disable_keyboard_controls();
    annotator.set_zoom(2.0).unwrap();
    annotator.set_require_selection_to_drag(false);

    assert_eq!(
        topics(&log),
        vec![
            "keyboardcontrolsdisabled",
            "zoomchange",
            "requireselectiontodragchanged",
        ]
    );
}

#[test]
fn test_broadcast_receiver_sees_events() {
    let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
    let mut rx = annotator.events().receiver();

    annotator.create_annotation(AnnotationOptions::default());

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.topic());
    }
    assert_eq!(seen, vec!["select", "annotationcreated"]);
}
