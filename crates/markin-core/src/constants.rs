//! Editor-wide constants.

use std::time::Duration;

/// Base stroke width for created shapes, before zoom normalization.
pub const DEFAULT_BASE_STROKE_WIDTH: f64 = 2.0;

/// Base radius for created circles, before zoom normalization.
pub const DEFAULT_BASE_RADIUS: f64 = 5.0;

/// Radius of manipulation handles at zoom 1.
pub const HANDLE_RADIUS: f64 = 4.0;

/// Selected circles are drawn at this multiple of their base radius.
pub const HIGHLIGHT_RADIUS_FACTOR: f64 = 3.0;

/// Fill opacity applied to a highlighted circle.
pub const HIGHLIGHT_FILL_OPACITY: &str = "0.05";

/// Dash pattern applied to selected outlines.
pub const HIGHLIGHT_DASH: &str = "5,5";

/// Pick distance, in canvas units, for thin shapes such as lines.
pub const HIT_TOLERANCE: f64 = 3.0;

/// How long the click that trails a pointer-up is ignored.
pub const DRAG_CLICK_GUARD: Duration = Duration::from_millis(200);

/// Default undo history capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Version stamped into exported annotation documents.
pub const EXPORT_FORMAT_VERSION: &str = "0.0.1";

/// Keyboard nudge distances.
pub const NUDGE_STEP: f64 = 1.0;
pub const NUDGE_STEP_WIDE: f64 = 10.0;
pub const NUDGE_STEP_PRECISE: f64 = 0.2;
