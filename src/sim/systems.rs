// Force-phase systems: snapshot the rosters, let each policy pick a force.

use bevy_ecs::prelude::*;

use super::policy::{AgentScratch, Policy, Role, Steer, SteeringContext};
use crate::engine::components::*;
use crate::engine::math::planar_distance;
use crate::engine::steering::{AgentSnapshot, ObstacleSnapshot};
use crate::engine::vehicle;

type AgentItems = (
    Entity,
    &'static mut Transform,
    &'static mut Velocity,
    &'static mut Kinematics,
    &'static Vehicle,
    &'static Policy,
    &'static mut Wander,
    &'static mut SteeringDebug,
);

/// Compute and apply every agent's net force for this tick.
///
/// All agents read the same start-of-phase snapshots, so the result does not
/// depend on query order.
pub fn steering_system(
    clock: Res<SimClock>,
    settings: Res<SimSettings>,
    bounds: Res<WorldBounds>,
    treasure: Option<Res<Treasure>>,
    mut rng: ResMut<SimRng>,
    obstacles: Query<(Entity, &Transform, &Obstacle), Without<Vehicle>>,
    mut agents: Query<AgentItems>,
) {
    let obstacle_snapshots: Vec<ObstacleSnapshot> = obstacles
        .iter()
        .map(|(entity, transform, obstacle)| ObstacleSnapshot {
            entity,
            position: transform.position,
            radius: obstacle.radius,
        })
        .collect();

    let mut humans = Vec::new();
    let mut zombies = Vec::new();
    for (entity, transform, velocity, kinematics, body, policy, _, _) in agents.iter() {
        let snapshot = AgentSnapshot {
            entity,
            position: transform.position,
            velocity: velocity.linear,
            direction: kinematics.direction,
            radius: body.radius,
            max_speed: body.max_speed,
        };
        match policy.role() {
            Role::Human => humans.push(snapshot),
            Role::Zombie => zombies.push(snapshot),
        }
    }

    let ctx = SteeringContext {
        humans: &humans,
        zombies: &zombies,
        obstacles: &obstacle_snapshots,
        bounds: &bounds,
        steering: &settings.steering,
        treasure: treasure.map(|t| t.position),
        dt: clock.dt,
    };

    for (entity, mut transform, mut velocity, mut kinematics, body, policy, mut wander, mut debug) in
        agents.iter_mut()
    {
        let me = AgentSnapshot {
            entity,
            position: transform.position,
            velocity: velocity.linear,
            direction: kinematics.direction,
            radius: body.radius,
            max_speed: body.max_speed,
        };
        vehicle::begin_force_phase(&mut kinematics);
        let scratch = AgentScratch {
            wander: &mut wander,
            debug: &mut debug,
        };
        match policy.steer(&me, body.max_force, scratch, &ctx, &mut rng.0) {
            Steer::Force(force) => vehicle::apply_force(&mut kinematics, body, force),
            Steer::Park(point) => {
                vehicle::park(&mut transform, &mut velocity, &mut kinematics, point);
            }
        }
    }
}

/// A human within its own radius of the treasure grabs it; the treasure then
/// jumps to a random point inside the bounds. At most one grab per tick.
pub fn treasure_system(
    treasure: Option<ResMut<Treasure>>,
    mut rng: ResMut<SimRng>,
    bounds: Res<WorldBounds>,
    humans: Query<(&Transform, &Vehicle, &Policy)>,
) {
    let Some(mut treasure) = treasure else {
        return;
    };
    let grabbed = humans.iter().any(|(transform, body, policy)| {
        policy.role() == Role::Human
            && planar_distance(transform.position, treasure.position) < body.radius
    });
    if grabbed {
        let height = treasure.position.y;
        treasure.position = super::random_point(&mut rng.0, &bounds, height);
        treasure.grabs += 1;
        log::debug!("treasure grabbed, moved to {:?}", treasure.position);
    }
}
