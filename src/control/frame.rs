use std::f64::consts::{PI, TAU};

// ---------------------------------------------------------------------------
// Yaw-only frame rotation between world (north/west) and body axes
// ---------------------------------------------------------------------------

/// Rotate a world-aligned horizontal vector into body axes.
pub fn world_to_body(north: f64, west: f64, yaw: f64) -> (f64, f64) {
    let (s, c) = yaw.sin_cos();
    (c * north + s * west, -s * north + c * west)
}

/// Rotate a body-frame horizontal vector back into world axes.
pub fn body_to_world(x: f64, y: f64, yaw: f64) -> (f64, f64) {
    let (s, c) = yaw.sin_cos();
    (c * x - s * y, s * x + c * y)
}

/// Wrap an angle into (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
