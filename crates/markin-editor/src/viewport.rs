//! Viewport and coordinate transformation for pointer input.
//!
//! Handles conversion between device coordinates (where pointer events are
//! reported) and canvas coordinates (where shapes live). This transform is
//! independent of the annotator zoom, which only drives stroke widths, radii
//! and handle sizes.

use std::fmt;

use markin_core::Point;

/// Represents the device-to-canvas transformation (scale and pan).
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    scale_x: f64,
    scale_y: f64,
    pan_x: f64,
    pan_y: f64,
    canvas_width: Option<f64>,
    canvas_height: Option<f64>,
}

impl Viewport {
    /// Identity transform with no known canvas size.
    pub fn new() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            canvas_width: None,
            canvas_height: None,
        }
    }

    /// Gets the canvas width, if set.
    pub fn canvas_width(&self) -> Option<f64> {
        self.canvas_width
    }

    /// Gets the canvas height, if set.
    pub fn canvas_height(&self) -> Option<f64> {
        self.canvas_height
    }

    /// Sets the canvas dimensions used to infer normalization size.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_width = Some(width);
        self.canvas_height = Some(height);
    }

    /// Gets the device pixels per canvas unit on each axis.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Sets the per-axis scale. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        if scale_x > 0.0 && scale_y > 0.0 {
            self.scale_x = scale_x;
            self.scale_y = scale_y;
        } else {
            tracing::warn!("Ignoring viewport scale ({}, {})", scale_x, scale_y);
        }
    }

    /// Gets the pan offset in device pixels.
    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    /// Sets the pan offset.
    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan_x = x;
        self.pan_y = y;
    }

    /// Pans by a delta amount.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Converts a device point to canvas coordinates.
    ///
    /// Formula:
    /// ```text
    /// canvas_x = (device_x - pan_x) / scale_x
    /// canvas_y = (device_y - pan_y) / scale_y
    /// ```
    pub fn to_canvas_point(&self, device: Point) -> Point {
        Point::new(
            (device.x - self.pan_x) / self.scale_x,
            (device.y - self.pan_y) / self.scale_y,
        )
    }

    /// Converts a device-space displacement to canvas units.
    ///
    /// Pan does not affect deltas.
    pub fn to_canvas_delta(&self, device_delta: Point) -> Point {
        Point::new(device_delta.x / self.scale_x, device_delta.y / self.scale_y)
    }

    /// Converts a canvas point back to device coordinates.
    pub fn to_device_point(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.scale_x + self.pan_x,
            canvas.y * self.scale_y + self.pan_y,
        )
    }

    /// Resets to the identity transform, keeping the canvas size.
    pub fn reset(&mut self) {
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scale: ({:.2}, {:.2}) | Pan: ({:.1}, {:.1})",
            self.scale_x, self.scale_y, self.pan_x, self.pan_y
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}
