// Small vector helpers shared by the steering and kinematics code.
// Everything works on the XZ ground plane; Y is carried but ignored for distances.

use glam::Vec3;

/// Denominators below this are clamped before dividing.
pub const EPSILON: f32 = 1e-4;

/// Re-maps `value` from `[from_start, from_end]` into `[to_start, to_end]`.
///
/// Not clamped: values outside the source range extrapolate linearly.
/// A degenerate source range returns `to_end`.
#[inline]
pub fn remap(value: f32, from_start: f32, from_end: f32, to_start: f32, to_end: f32) -> f32 {
    let span = from_end - from_start;
    if span.abs() < EPSILON {
        return to_end;
    }
    (value - from_start) / span * (to_end - to_start) + to_start
}

/// Drop the vertical component.
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Planar distance between two points.
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Scales `v` down to `max` if it is longer. Zero stays zero.
#[inline]
pub fn clamp_magnitude(v: Vec3, max: f32) -> Vec3 {
    v.clamp_length_max(max.max(0.0))
}

/// Right-hand axis of a planar heading: `direction` rotated 90° about +Y.
/// Forward +Z maps to right +X.
#[inline]
pub fn right_of(direction: Vec3) -> Vec3 {
    Vec3::new(direction.z, 0.0, -direction.x).normalize_or_zero()
}
