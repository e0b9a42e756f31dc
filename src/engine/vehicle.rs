// Per-agent kinematics: force accumulation and Euler integration.
//
// A tick runs in two phases, always in this order:
//   1. force phase: `begin_force_phase`, then one `apply_force` with the
//      clamped net force from the agent's policy.
//   2. integration: `integrate`.

use glam::Vec3;

use super::components::{Kinematics, Transform, Vehicle, Velocity};
use super::math::{clamp_magnitude, planar};

/// Zero the transient acceleration before any force is applied this tick.
pub fn begin_force_phase(kinematics: &mut Kinematics) {
    kinematics.acceleration = Vec3::ZERO;
    kinematics.applied_force = Vec3::ZERO;
}

/// Clamp `force` to the vehicle's max force and add `force / mass` to the
/// acceleration. Vertical acceleration is always discarded.
pub fn apply_force(kinematics: &mut Kinematics, vehicle: &Vehicle, force: Vec3) {
    let force = clamp_magnitude(force, vehicle.max_force);
    kinematics.applied_force += force;
    kinematics.acceleration += force / vehicle.mass;
    kinematics.acceleration.y = 0.0;
}

/// Semi-implicit Euler step followed by heading updates.
pub fn integrate(
    transform: &mut Transform,
    velocity: &mut Velocity,
    kinematics: &mut Kinematics,
    dt: f32,
    smoothing: f32,
) {
    velocity.linear += kinematics.acceleration * dt;
    transform.position += velocity.linear * dt;

    // Direction sticks to the last nonzero velocity.
    if let Some(direction) = velocity.linear.try_normalize() {
        kinematics.direction = direction;
    }
    transform.forward = smooth_heading(transform.forward, kinematics.direction, smoothing, dt);
}

/// Ease `current` toward `target` with a time-scaled lerp.
pub fn smooth_heading(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    let target = planar(target);
    let t = (rate * dt).clamp(0.0, 1.0);
    current.lerp(target, t).try_normalize().unwrap_or(target)
}

/// Pin an agent onto `point` (planar; height unchanged) with no motion.
pub fn park(transform: &mut Transform, velocity: &mut Velocity, kinematics: &mut Kinematics, point: Vec3) {
    transform.position.x = point.x;
    transform.position.z = point.z;
    velocity.linear = Vec3::ZERO;
    kinematics.acceleration = Vec3::ZERO;
}
