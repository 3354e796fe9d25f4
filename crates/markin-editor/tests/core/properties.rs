use markin_core::{Bounds, Corner, Point};
use markin_editor::{
    resize_rect, AnnotationOptions, Annotator, AnnotatorOptions, KeypointSpec, Shape, Viewport,
};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn corner() -> impl Strategy<Value = Corner> {
    prop_oneof![
        Just(Corner::TopLeft),
        Just(Corner::TopRight),
        Just(Corner::BottomLeft),
        Just(Corner::BottomRight),
    ]
}

/// The corner diagonally across from `corner`.
fn anchor(b: &Bounds, corner: Corner) -> Point {
    match corner {
        Corner::TopLeft => Point::new(b.right(), b.bottom()),
        Corner::TopRight => Point::new(b.x, b.bottom()),
        Corner::BottomLeft => Point::new(b.right(), b.y),
        Corner::BottomRight => Point::new(b.x, b.y),
    }
}

proptest! {
    #[test]
    fn resize_keeps_opposite_corner(
        x in -500.0..500.0f64,
        y in -500.0..500.0f64,
        width in 1.0..400.0f64,
        height in 1.0..400.0f64,
        dx in -600.0..600.0f64,
        dy in -600.0..600.0f64,
        corner in corner(),
    ) {
        let rect = Bounds::new(x, y, width, height);
        match resize_rect(rect, corner, Point::new(dx, dy)) {
            Some(resized) => {
                prop_assert!(resized.width > 0.0 && resized.height > 0.0);
                let before = anchor(&rect, corner);
                let after = anchor(&resized, corner);
                prop_assert!((before.x - after.x).abs() < EPS);
                prop_assert!((before.y - after.y).abs() < EPS);
            }
            None => {
                let grows_x = matches!(corner, Corner::TopRight | Corner::BottomRight);
                let grows_y = matches!(corner, Corner::BottomLeft | Corner::BottomRight);
                let w = if grows_x { width + dx } else { width - dx };
                let h = if grows_y { height + dy } else { height - dy };
                prop_assert!(w <= 0.0 || h <= 0.0);
            }
        }
    }

    #[test]
    fn viewport_round_trip(
        scale in 0.1..8.0f64,
        pan_x in -300.0..300.0f64,
        pan_y in -300.0..300.0f64,
        px in -1000.0..1000.0f64,
        py in -1000.0..1000.0f64,
    ) {
        let mut viewport = Viewport::new();
        viewport.set_scale(scale, scale);
        viewport.set_pan(pan_x, pan_y);
        let p = Point::new(px, py);
        let back = viewport.to_canvas_point(viewport.to_device_point(p));
        prop_assert!((back.x - p.x).abs() < EPS);
        prop_assert!((back.y - p.y).abs() < EPS);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dragged_keypoint_stays_in_bbox(dx in -500.0..500.0f64, dy in -500.0..500.0f64) {
        let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
        annotator.create_annotation(AnnotationOptions {
            uuid: Some("p".to_string()),
            bbox: Some([0.0, 0.0, 200.0, 150.0]),
            keypoints: vec![KeypointSpec {
                name: Some("k".to_string()),
                point: vec![100.0, 75.0],
            }],
            ..Default::default()
        });
        let keypoint = annotator.lookup("keypoint-k-p").unwrap();
        annotator.select(keypoint);

        let start = Point::new(100.0, 75.0);
        prop_assert!(annotator.pointer_down(start));
        let end = Point::new(start.x + dx, start.y + dy);
        annotator.pointer_move(end);
        annotator.pointer_up(end);

        match annotator.scene().get(keypoint).unwrap().shape {
            Shape::Circle { cx, cy, r, .. } => {
                prop_assert!(cx - r >= -EPS && cx + r <= 200.0 + EPS);
                prop_assert!(cy - r >= -EPS && cy + r <= 150.0 + EPS);
            }
            ref other => prop_assert!(false, "not a circle: {:?}", other),
        }
    }

    #[test]
    fn dragged_polygon_keeps_shape_inside_bbox(dx in -400.0..400.0f64, dy in -400.0..400.0f64) {
        let mut annotator = Annotator::new(AnnotatorOptions::default()).unwrap();
        annotator.create_annotation(AnnotationOptions {
            uuid: Some("q".to_string()),
            bbox: Some([0.0, 0.0, 300.0, 200.0]),
            segmentation: Some(vec![50.0, 50.0, 150.0, 50.0, 100.0, 120.0]),
            ..Default::default()
        });
        let polygon = annotator.lookup("polygon-q").unwrap();
        let original = match &annotator.scene().get(polygon).unwrap().shape {
            Shape::Polygon { points } => points.clone(),
            _ => unreachable!(),
        };

        let inside = Point::new(100.0, 70.0);
        annotator.click(inside);
        prop_assert_eq!(annotator.selected(), Some(polygon));
        prop_assert!(annotator.pointer_down(inside));
        let end = Point::new(inside.x + dx, inside.y + dy);
        annotator.pointer_move(end);
        annotator.pointer_up(end);

        let points = match &annotator.scene().get(polygon).unwrap().shape {
            Shape::Polygon { points } => points.clone(),
            _ => unreachable!(),
        };
        let shift = Point::new(points[0].x - original[0].x, points[0].y - original[0].y);
        for (moved, before) in points.iter().zip(&original) {
            prop_assert!((moved.x - before.x - shift.x).abs() < EPS);
            prop_assert!((moved.y - before.y - shift.y).abs() < EPS);
            prop_assert!(moved.x >= -EPS && moved.x <= 300.0 + EPS);
            prop_assert!(moved.y >= -EPS && moved.y <= 200.0 + EPS);
        }
    }
}
