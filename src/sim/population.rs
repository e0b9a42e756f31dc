// Roster management: spawning agents and the human -> zombie conversion rule.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::policy::{HumanPolicy, Policy, Role, ZombiePolicy};
use crate::config::{BodyConfig, HumanConfig, ZombieConfig};
use crate::engine::components::*;
use crate::engine::math::planar_distance;
use crate::engine::spatial::SpatialGrid;

/// Role templates new agents are stamped from.
#[derive(Resource, Debug, Clone)]
pub struct RoleTemplates {
    pub human: HumanConfig,
    pub zombie: ZombieConfig,
}

/// Broad-phase grid reused by every conversion pass.
#[derive(Resource)]
pub struct ConversionGrid(pub SpatialGrid);

fn vehicle_from(body: &BodyConfig) -> Vehicle {
    Vehicle {
        mass: body.mass,
        radius: body.radius,
        max_speed: body.max_speed,
        max_force: body.max_force,
    }
}

/// Spawn an agent of `role` at `position`. The vertical coordinate is kept as
/// given; callers decide the spawn height.
pub fn spawn_agent(world: &mut World, role: Role, position: Vec3) -> Entity {
    let templates = world.resource::<RoleTemplates>();
    let (body, policy) = match role {
        Role::Human => (
            vehicle_from(&templates.human.body),
            Policy::Human(HumanPolicy::from(&templates.human)),
        ),
        Role::Zombie => (
            vehicle_from(&templates.zombie.body),
            Policy::Zombie(ZombiePolicy::from(&templates.zombie)),
        ),
    };
    let entity = world
        .spawn((
            Transform::from_position(position),
            Velocity::default(),
            Kinematics::default(),
            body,
            policy,
            Wander::default(),
            SteeringDebug::default(),
        ))
        .id();
    log::debug!("spawned {role:?} {entity:?} at {position}");
    entity
}

pub fn spawn_obstacle(world: &mut World, position: Vec3, radius: f32) -> Entity {
    let entity = world
        .spawn((Transform::from_position(position), Obstacle { radius }))
        .id();
    log::debug!("spawned obstacle {entity:?} r={radius} at {position}");
    entity
}

/// Humans that touch a zombie this tick, in roster order, each listed once.
///
/// Positions are sampled once up front, so the result does not depend on the
/// order pairs are examined in and freshly converted zombies convert nobody
/// until the next tick.
pub fn pending_conversions(world: &mut World) -> Vec<(Entity, Vec3)> {
    let mut humans = Vec::new();
    let mut zombies = Vec::new();
    let mut query = world.query::<(Entity, &Transform, &Vehicle, &Policy)>();
    for (entity, transform, body, policy) in query.iter(world) {
        match policy.role() {
            Role::Human => humans.push((entity, transform.position, body.radius)),
            Role::Zombie => zombies.push((transform.position, body.radius)),
        }
    }
    if humans.is_empty() || zombies.is_empty() {
        return Vec::new();
    }

    let mut grid = world.resource_mut::<ConversionGrid>();
    let grid = &mut grid.0;
    grid.clear();
    let mut max_human_radius = 0.0f32;
    for (i, &(_, position, radius)) in humans.iter().enumerate() {
        grid.insert(position, i);
        max_human_radius = max_human_radius.max(radius);
    }

    let mut converted = vec![false; humans.len()];
    let mut candidates = Vec::new();
    for &(zombie_pos, zombie_radius) in &zombies {
        candidates.clear();
        grid.query_radius(zombie_pos, zombie_radius + max_human_radius, &mut candidates);
        for &i in &candidates {
            let (_, human_pos, human_radius) = humans[i];
            if planar_distance(zombie_pos, human_pos) < zombie_radius + human_radius {
                converted[i] = true;
            }
        }
    }

    humans
        .into_iter()
        .zip(converted)
        .filter(|(_, hit)| *hit)
        .map(|((entity, position, _), _)| (entity, position))
        .collect()
}

/// Exclusive system: runs before any agent reads the rosters this tick.
///
/// Every touched human is despawned and replaced by a zombie at its last
/// position.
pub fn conversion_system(world: &mut World) {
    let queue = pending_conversions(world);
    for &(human, position) in &queue {
        world.despawn(human);
        let zombie = spawn_agent(world, Role::Zombie, position);
        log::debug!("human {human:?} converted into zombie {zombie:?}");
    }

    let mut stats = world.resource_mut::<PopulationStats>();
    stats.ticks += 1;
    stats.last_tick_conversions = queue.len() as u32;
    stats.conversions += queue.len() as u64;
    if !queue.is_empty() {
        log::info!(
            "tick {}: {} human(s) converted ({} total)",
            stats.ticks,
            queue.len(),
            stats.conversions
        );
    }
}
