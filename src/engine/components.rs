// Core ECS components and resources for the steering engine.
// Agents and obstacles are plain entities; world-wide state lives in resources.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{BoundaryMode, SteeringConfig};

/// Position of an entity plus the smoothed heading used for rendering.
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    /// Unit heading eased toward `Kinematics::direction` every tick.
    pub forward: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::X,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Velocity of an entity in 3D space (units per second)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
}

/// Transient per-tick motion state.
#[derive(Component, Debug, Clone, Copy)]
pub struct Kinematics {
    /// Reset to zero at the start of every force phase.
    pub acceleration: Vec3,
    /// Normalized velocity. Keeps its last value while the agent is at rest.
    pub direction: Vec3,
    /// Net force applied during the last force phase, after clamping.
    pub applied_force: Vec3,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            acceleration: Vec3::ZERO,
            direction: Vec3::X,
            applied_force: Vec3::ZERO,
        }
    }
}

/// Physical parameters of a steered agent.
#[derive(Component, Debug, Clone, Copy)]
pub struct Vehicle {
    pub mass: f32,
    /// Collision radius in world units.
    pub radius: f32,
    pub max_speed: f32,
    pub max_force: f32,
}

/// Private wander state: current angle on the wander circle and time since
/// the last full resample.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Wander {
    pub angle: f32,
    pub timer: f32,
}

/// Which side of an agent's path an obstacle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Per-frame diagnostics. Written by the force phase, never read by it.
#[derive(Component, Debug, Clone, Default)]
pub struct SteeringDebug {
    /// Obstacles considered this frame, with the side each was on.
    pub obstacle_sides: Vec<(Entity, Side)>,
    /// Predicted point used by pursue/evade, if any.
    pub future_position: Option<Vec3>,
    /// Entity currently pursued (zombies only).
    pub target: Option<Entity>,
}

/// Static circular obstacle. Its position comes from the entity's `Transform`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Obstacle {
    pub radius: f32,
}

// ============================================================================
// RESOURCES
// ============================================================================

/// Axis-aligned playfield on the XZ plane. `min`/`max` hold (x, z).
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.y && p.z <= self.max.y
    }

    pub fn center(&self) -> Vec3 {
        let c = (self.min + self.max) * 0.5;
        Vec3::new(c.x, 0.0, c.y)
    }
}

/// Fixed step for the tick currently being run.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub dt: f32,
    pub tick: u64,
}

/// Session-wide settings shared by every agent.
#[derive(Resource, Debug, Clone)]
pub struct SimSettings {
    pub steering: SteeringConfig,
    pub boundary_mode: BoundaryMode,
    /// Process-wide debug display flag.
    pub debug_enabled: bool,
}

/// The single random source for wander resampling and placement.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Running totals kept by the manager.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationStats {
    pub ticks: u64,
    pub conversions: u64,
    /// Conversions in the most recent tick.
    pub last_tick_conversions: u32,
}

/// Point goal for humans. Relocates when grabbed.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Treasure {
    pub position: Vec3,
    pub grabs: u32,
}
