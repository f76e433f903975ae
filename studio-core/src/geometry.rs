//! Pure geometry helpers for the viewBox engine and input normalization.

/// Wheel deltas at or above this magnitude are treated as discrete
/// mouse-wheel notches rather than trackpad scroll.
pub const WHEEL_NOTCH_THRESHOLD: f64 = 40.0;

/// Multiplicative zoom step applied per discrete mouse-wheel notch.
const MOUSE_NOTCH_FACTOR: f64 = 1.1;

/// Exponent scale for continuous trackpad deltas.
const TRACKPAD_SENSITIVITY: f64 = 0.01;

/// The physical device a wheel event most likely came from.
///
/// Browsers deliver both mouse wheels and trackpad scrolling/pinching as
/// `wheel` events; the two need different zoom semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDevice {
    /// Discrete notched mouse wheel.
    Mouse,
    /// Continuous trackpad scroll or pinch.
    Trackpad,
}

/// Classify a wheel event by its delta characteristics.
///
/// Pinch gestures on trackpads arrive with `ctrl_key` set. Plain trackpad
/// scrolling reports small, often fractional pixel deltas, while mouse
/// notches arrive as large fixed steps (typically +/-100 or +/-120).
#[must_use]
pub fn classify_wheel(delta_y: f64, ctrl_key: bool) -> WheelDevice {
    if ctrl_key {
        return WheelDevice::Trackpad;
    }
    if delta_y.abs() < WHEEL_NOTCH_THRESHOLD || delta_y.fract().abs() > f64::EPSILON {
        WheelDevice::Trackpad
    } else {
        WheelDevice::Mouse
    }
}

/// Convert a wheel delta into a multiplicative zoom factor.
///
/// Mouse notches map to a fixed step per event; trackpad deltas map to a
/// smooth exponential so slow pinches produce slow zooms.
#[must_use]
pub fn wheel_zoom_factor(delta_y: f64, ctrl_key: bool) -> f64 {
    match classify_wheel(delta_y, ctrl_key) {
        WheelDevice::Mouse => {
            if delta_y < 0.0 {
                MOUSE_NOTCH_FACTOR
            } else {
                1.0 / MOUSE_NOTCH_FACTOR
            }
        }
        WheelDevice::Trackpad => (-delta_y * TRACKPAD_SENSITIVITY).exp(),
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

/// Largest uniform scale at which `content` fits inside `avail`.
///
/// Returns 0.0 when any dimension is non-positive or non-finite, so callers
/// can treat "does not fit" and "not measurable yet" uniformly.
#[must_use]
pub fn scale_to_fit(content_w: f64, content_h: f64, avail_w: f64, avail_h: f64) -> f64 {
    if !all_finite(&[content_w, content_h, avail_w, avail_h]) {
        return 0.0;
    }
    if content_w <= 0.0 || content_h <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
        return 0.0;
    }
    (avail_w / content_w).min(avail_h / content_h)
}

/// Clamp `value` to `[lo, hi]`, returning the midpoint when the interval is
/// inverted (the axis-locked case where there is no legal range).
#[must_use]
pub fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        (lo + hi) / 2.0
    } else {
        value.clamp(lo, hi)
    }
}

/// Check that every value is finite.
#[must_use]
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
