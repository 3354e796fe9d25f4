//! Shape factory.
//!
//! Builds scene nodes with zoom-normalized stroke widths and radii: the base
//! value is stored on the node and the drawn value is `base / zoom`.

use markin_core::constants::{DEFAULT_BASE_RADIUS, DEFAULT_BASE_STROKE_WIDTH};
use markin_core::Point;

use crate::scene::{GroupData, Node, Shape};

#[derive(Debug, Clone)]
pub struct ShapeFactory {
    zoom: f64,
}

impl ShapeFactory {
    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn create_rect(&self, x: f64, y: f64, width: f64, height: f64) -> Node {
        self.stroked(Shape::Rect {
            x,
            y,
            width,
            height,
        })
    }

    /// Circle with `base_radius` (default 5) drawn at `base_radius / zoom`.
    pub fn create_circle(&self, cx: f64, cy: f64, base_radius: Option<f64>) -> Node {
        let base_radius = base_radius
            .filter(|r| *r > 0.0)
            .unwrap_or(DEFAULT_BASE_RADIUS);
        self.stroked(Shape::Circle {
            cx,
            cy,
            r: base_radius / self.zoom,
            base_radius,
            saved: None,
        })
    }

    pub fn create_polygon(&self, points: Vec<Point>) -> Node {
        self.stroked(Shape::Polygon { points })
    }

    pub fn create_line(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Node {
        self.stroked(Shape::Line { x1, y1, x2, y2 })
    }

    pub fn create_group(&self, data: GroupData) -> Node {
        Node::new(Shape::Group(data))
    }

    fn stroked(&self, shape: Shape) -> Node {
        let mut node = Node::new(shape);
        node.base_stroke_width = DEFAULT_BASE_STROKE_WIDTH;
        node.stroke_width = DEFAULT_BASE_STROKE_WIDTH / self.zoom;
        node
    }
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::new(1.0)
    }
}
