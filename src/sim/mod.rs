// Humans vs Zombies: the world/population manager.
//
// `Simulation` owns the ECS world and the tick schedule. Each tick runs, in
// order: conversion (exclusive) -> steering -> integration -> bounce -> treasure.

pub mod policy;
pub mod population;
pub mod systems;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use glam::Vec3;
use rand::Rng;

use crate::config::{SimConfig, SimConfigError};
use crate::engine::components::*;
use crate::engine::spatial::SpatialGrid;
use crate::engine::systems::{bounce_system, integration_system};
use policy::{Policy, Role};
use population::{ConversionGrid, RoleTemplates};

pub use population::{conversion_system, pending_conversions};
pub use systems::{steering_system, treasure_system};

/// Read-only view of one agent, for renderers and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub entity: Entity,
    pub role: Role,
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Vec3,
    /// Smoothed heading for rendering.
    pub forward: Vec3,
    pub radius: f32,
    /// Net force applied in the last force phase.
    pub applied_force: Vec3,
    /// Whether debug display is on for this agent. Every agent follows the
    /// shared flag, including zombies created after it was toggled.
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleView {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
}

/// Uniform point inside `bounds` at the given height.
pub fn random_point<R: Rng + ?Sized>(rng: &mut R, bounds: &WorldBounds, height: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(bounds.min.x..=bounds.max.x),
        height,
        rng.gen_range(bounds.min.y..=bounds.max.y),
    )
}

type AgentData = (
    Entity,
    &'static Transform,
    &'static Velocity,
    &'static Kinematics,
    &'static Vehicle,
    &'static Policy,
);
type ObstacleData = (Entity, &'static Transform, &'static Obstacle);

pub struct Simulation {
    world: World,
    schedule: Schedule,
    // Refreshed after every mutation so the read-only accessors can take `&self`.
    agent_query: QueryState<AgentData>,
    obstacle_query: QueryState<ObstacleData>,
}

impl Simulation {
    /// Validate `config` and populate the world with its initial roster.
    pub fn new(config: SimConfig) -> Result<Self, SimConfigError> {
        let mut sim = Self::empty(config.clone())?;
        sim.populate(&config);
        Ok(sim)
    }

    /// A world with bounds and settings but no agents or obstacles.
    pub fn empty(config: SimConfig) -> Result<Self, SimConfigError> {
        config.validate()?;

        let bounds = WorldBounds::new(config.bounds_min, config.bounds_max);
        let mut world = World::new();
        world.insert_resource(bounds);
        world.insert_resource(SimClock::default());
        world.insert_resource(SimSettings {
            steering: config.steering,
            boundary_mode: config.boundary_mode,
            debug_enabled: config.debug_enabled,
        });
        world.insert_resource(SimRng::from_seed(config.seed));
        world.insert_resource(PopulationStats::default());
        world.insert_resource(RoleTemplates {
            human: config.human,
            zombie: config.zombie,
        });
        world.insert_resource(ConversionGrid(SpatialGrid::new(
            config.bounds_min,
            config.bounds_max,
            config.grid_cell_size,
        )));

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                conversion_system,
                steering_system,
                integration_system,
                bounce_system,
                treasure_system,
            )
                .chain(),
        );

        let agent_query = world.query::<AgentData>();
        let obstacle_query = world.query::<ObstacleData>();
        Ok(Self {
            world,
            schedule,
            agent_query,
            obstacle_query,
        })
    }

    fn populate(&mut self, config: &SimConfig) {
        let bounds = *self.world.resource::<WorldBounds>();
        for _ in 0..config.num_obstacles {
            let (position, radius) = {
                let mut rng = self.world.resource_mut::<SimRng>();
                let position = random_point(&mut rng.0, &bounds, config.obstacle_height);
                let radius = rng
                    .0
                    .gen_range(config.obstacle_radius_min..=config.obstacle_radius_max);
                (position, radius)
            };
            self.spawn_obstacle(position, radius);
        }
        for _ in 0..config.num_humans {
            let position = self.random_position();
            self.spawn_human(position);
        }
        for _ in 0..config.num_zombies {
            let position = self.random_position();
            self.spawn_zombie(position);
        }
        if config.treasure {
            let position = self.random_position();
            self.world.insert_resource(Treasure { position, grabs: 0 });
        }
        log::info!(
            "populated world: {} humans, {} zombies, {} obstacles",
            config.num_humans,
            config.num_zombies,
            config.num_obstacles
        );
    }

    fn random_position(&mut self) -> Vec3 {
        let bounds = *self.world.resource::<WorldBounds>();
        let mut rng = self.world.resource_mut::<SimRng>();
        random_point(&mut rng.0, &bounds, 0.0)
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("ignoring tick with dt = {dt}");
            return;
        }
        {
            let mut clock = self.world.resource_mut::<SimClock>();
            clock.dt = dt;
            clock.tick += 1;
        }
        self.schedule.run(&mut self.world);
        self.refresh_queries();
    }

    fn refresh_queries(&mut self) {
        self.agent_query.update_archetypes(&self.world);
        self.obstacle_query.update_archetypes(&self.world);
    }

    fn spawn_role(&mut self, role: Role, mut position: Vec3) -> Entity {
        let templates = self.world.resource::<RoleTemplates>();
        position.y = match role {
            Role::Human => templates.human.body.spawn_height,
            Role::Zombie => templates.zombie.body.spawn_height,
        };
        let entity = population::spawn_agent(&mut self.world, role, position);
        self.refresh_queries();
        entity
    }

    /// Place a human. The height is replaced by the human spawn height.
    pub fn spawn_human(&mut self, position: Vec3) -> Entity {
        self.spawn_role(Role::Human, position)
    }

    /// Place a zombie. The height is replaced by the zombie spawn height.
    pub fn spawn_zombie(&mut self, position: Vec3) -> Entity {
        self.spawn_role(Role::Zombie, position)
    }

    pub fn spawn_obstacle(&mut self, position: Vec3, radius: f32) -> Entity {
        let entity = population::spawn_obstacle(&mut self.world, position, radius.max(0.0));
        self.refresh_queries();
        entity
    }

    /// Place or move the treasure.
    pub fn set_treasure(&mut self, position: Vec3) {
        self.world.insert_resource(Treasure { position, grabs: 0 });
    }

    pub fn treasure(&self) -> Option<Vec3> {
        self.world.get_resource::<Treasure>().map(|t| t.position)
    }

    fn views(&self, role: Option<Role>) -> Vec<AgentView> {
        let debug = self.debug_enabled();
        self.agent_query
            .iter_manual(&self.world)
            .filter(|(.., policy)| role.is_none_or(|r| policy.role() == r))
            .map(|(entity, transform, velocity, kinematics, body, policy)| AgentView {
                entity,
                role: policy.role(),
                position: transform.position,
                velocity: velocity.linear,
                direction: kinematics.direction,
                forward: transform.forward,
                radius: body.radius,
                applied_force: kinematics.applied_force,
                debug,
            })
            .collect()
    }

    pub fn humans(&self) -> Vec<AgentView> {
        self.views(Some(Role::Human))
    }

    pub fn zombies(&self) -> Vec<AgentView> {
        self.views(Some(Role::Zombie))
    }

    /// Humans and zombies together.
    pub fn vehicles(&self) -> Vec<AgentView> {
        self.views(None)
    }

    fn count(&self, role: Role) -> usize {
        self.agent_query
            .iter_manual(&self.world)
            .filter(|(.., policy)| policy.role() == role)
            .count()
    }

    pub fn human_count(&self) -> usize {
        self.count(Role::Human)
    }

    pub fn zombie_count(&self) -> usize {
        self.count(Role::Zombie)
    }

    pub fn obstacles(&self) -> Vec<ObstacleView> {
        self.obstacle_query
            .iter_manual(&self.world)
            .map(|(entity, transform, obstacle)| ObstacleView {
                entity,
                position: transform.position,
                radius: obstacle.radius,
            })
            .collect()
    }

    pub fn agent(&self, entity: Entity) -> Option<AgentView> {
        let policy = self.world.get::<Policy>(entity)?;
        let transform = self.world.get::<Transform>(entity)?;
        let velocity = self.world.get::<Velocity>(entity)?;
        let kinematics = self.world.get::<Kinematics>(entity)?;
        let body = self.world.get::<Vehicle>(entity)?;
        Some(AgentView {
            entity,
            role: policy.role(),
            position: transform.position,
            velocity: velocity.linear,
            direction: kinematics.direction,
            forward: transform.forward,
            radius: body.radius,
            applied_force: kinematics.applied_force,
            debug: self.debug_enabled(),
        })
    }

    /// Last frame's steering diagnostics for `entity`.
    pub fn debug(&self, entity: Entity) -> Option<&SteeringDebug> {
        self.world.get::<SteeringDebug>(entity)
    }

    pub fn debug_enabled(&self) -> bool {
        self.world.resource::<SimSettings>().debug_enabled
    }

    /// Flip the shared debug display flag; returns the new value.
    pub fn toggle_debug(&mut self) -> bool {
        let mut settings = self.world.resource_mut::<SimSettings>();
        settings.debug_enabled = !settings.debug_enabled;
        settings.debug_enabled
    }

    pub fn stats(&self) -> PopulationStats {
        *self.world.resource::<PopulationStats>()
    }

    pub fn bounds(&self) -> WorldBounds {
        *self.world.resource::<WorldBounds>()
    }

    /// The underlying ECS world, for renderers that want raw component access.
    pub fn world(&self) -> &World {
        &self.world
    }
}
