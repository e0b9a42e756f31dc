// ECS systems for the integration half of a tick.
// The force half depends on behaviour policies and lives in `sim::systems`.

use bevy_ecs::prelude::*;

use super::components::*;
use super::vehicle;
use crate::config::BoundaryMode;

/// Integrate acceleration into velocity and velocity into position.
/// Runs every tick after the force phase.
pub fn integration_system(
    clock: Res<SimClock>,
    settings: Res<SimSettings>,
    mut query: Query<(&mut Transform, &mut Velocity, &mut Kinematics)>,
) {
    let smoothing = settings.steering.orientation_smoothing;
    for (mut transform, mut velocity, mut kinematics) in query.iter_mut() {
        vehicle::integrate(&mut transform, &mut velocity, &mut kinematics, clock.dt, smoothing);
    }
}

/// Hard walls: clamp onto the edge and turn the offending velocity inward.
/// Only active in `BoundaryMode::Bounce`.
pub fn bounce_system(
    bounds: Res<WorldBounds>,
    settings: Res<SimSettings>,
    mut query: Query<(&mut Transform, &mut Velocity), With<Vehicle>>,
) {
    if settings.boundary_mode != BoundaryMode::Bounce {
        return;
    }
    for (mut transform, mut velocity) in query.iter_mut() {
        let p = &mut transform.position;
        let v = &mut velocity.linear;
        if p.x > bounds.max.x {
            p.x = bounds.max.x;
            v.x = -v.x.abs();
        } else if p.x < bounds.min.x {
            p.x = bounds.min.x;
            v.x = v.x.abs();
        }
        if p.z > bounds.max.y {
            p.z = bounds.max.y;
            v.z = -v.z.abs();
        } else if p.z < bounds.min.y {
            p.z = bounds.min.y;
            v.z = v.z.abs();
        }
    }
}
