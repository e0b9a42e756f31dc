// Steering primitives (Reynolds-style).
//
// Every function reads a read-only `AgentSnapshot` and returns an unweighted
// force. Callers sum weighted contributions and clamp the total to the
// agent's max force. Only `wander` mutates state: the agent's own `Wander`.

use bevy_ecs::entity::Entity;
use glam::Vec3;
use rand::Rng;

use super::components::{Side, Wander, WorldBounds};
use super::math::{planar, remap, right_of, EPSILON};
use crate::config::SteeringConfig;

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Read-only kinematic state of one agent, collected before the force phase.
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Last nonzero normalized velocity.
    pub direction: Vec3,
    pub radius: f32,
    pub max_speed: f32,
}

impl AgentSnapshot {
    /// Right-hand axis used for obstacle side tests.
    pub fn right(&self) -> Vec3 {
        right_of(planar(self.direction))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObstacleSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
}

// ============================================================================
// SEEK / FLEE / PURSUE / EVADE
// ============================================================================

/// Force that turns the agent's velocity toward `target` at full speed.
/// Zero offset yields `-velocity` (desired velocity is zero, never NaN).
pub fn seek(agent: &AgentSnapshot, target: Vec3) -> Vec3 {
    let desired = planar(target - agent.position).normalize_or_zero() * agent.max_speed;
    desired - agent.velocity
}

/// Mirror of `seek`: desired velocity points away from `target`.
pub fn flee(agent: &AgentSnapshot, target: Vec3) -> Vec3 {
    let desired = planar(agent.position - target).normalize_or_zero() * agent.max_speed;
    desired - agent.velocity
}

/// Linear extrapolation of where `target` will be in `time_coeff` seconds.
#[inline]
pub fn predict(target: &AgentSnapshot, time_coeff: f32) -> Vec3 {
    target.position + target.velocity * time_coeff
}

pub fn pursue(agent: &AgentSnapshot, target: &AgentSnapshot, time_coeff: f32) -> Vec3 {
    seek(agent, predict(target, time_coeff))
}

pub fn evade(agent: &AgentSnapshot, target: &AgentSnapshot, time_coeff: f32) -> Vec3 {
    flee(agent, predict(target, time_coeff))
}

// ============================================================================
// ARRIVE
// ============================================================================

/// Desired speed at `distance` from an arrive target.
///
/// 0 at or inside `stop_radius`, `max_speed` at or beyond `slow_radius`,
/// linear in between. A collapsed slow band behaves like a hard stop.
pub fn arrive_speed(distance: f32, slow_radius: f32, stop_radius: f32, max_speed: f32) -> f32 {
    if distance <= stop_radius {
        0.0
    } else if distance >= slow_radius || slow_radius - stop_radius < EPSILON {
        max_speed
    } else {
        remap(distance, stop_radius, slow_radius, 0.0, max_speed)
    }
}

pub fn arrive(agent: &AgentSnapshot, target: Vec3, slow_radius: f32, stop_radius: f32) -> Vec3 {
    let offset = planar(target - agent.position);
    let speed = arrive_speed(offset.length(), slow_radius, stop_radius, agent.max_speed);
    offset.normalize_or_zero() * speed - agent.velocity
}

// ============================================================================
// WANDER
// ============================================================================

/// Seek a point on a circle projected ahead of the agent.
///
/// The angle is fully resampled once per `wander_period` of simulated time
/// and nudged by a small jitter on every other call.
pub fn wander<R: Rng + ?Sized>(
    agent: &AgentSnapshot,
    state: &mut Wander,
    params: &SteeringConfig,
    dt: f32,
    rng: &mut R,
) -> Vec3 {
    state.timer += dt;
    if state.timer >= params.wander_period {
        state.timer %= params.wander_period;
        let range = params.wander_angle_range.abs();
        state.angle = rng.gen_range(-range..=range);
    } else {
        let jitter = params.wander_jitter.abs();
        state.angle += rng.gen_range(-jitter..=jitter);
    }

    let center = agent.position + planar(agent.direction).normalize_or_zero() * params.wander_offset;
    let on_circle = Vec3::new(state.angle.cos(), 0.0, state.angle.sin()) * params.wander_radius;
    seek(agent, center + on_circle)
}

// ============================================================================
// SEPARATION
// ============================================================================

/// Flee every peer inside `radius`, weighted by 1 / distance.
/// Skips the agent itself and peers sitting exactly on top of it.
pub fn separation(agent: &AgentSnapshot, peers: &[AgentSnapshot], radius: f32) -> Vec3 {
    let mut force = Vec3::ZERO;
    for peer in peers {
        if peer.entity == agent.entity {
            continue;
        }
        let distance = planar(agent.position - peer.position).length();
        if distance <= EPSILON || distance >= radius {
            continue;
        }
        force += flee(agent, peer.position) / distance;
    }
    force
}

// ============================================================================
// OBSTACLE AVOIDANCE
// ============================================================================

/// Lateral push away from obstacles ahead that sit inside the agent's path.
///
/// An obstacle counts when it is in front (positive dot with velocity),
/// closer than `avoidance_range + obstacle.radius`, and its lateral offset is
/// within `agent.radius + obstacle.radius`. Strength goes from 0 at the edge of
/// detection to 1 at touching distance. Every obstacle counted is appended to
/// `sides` with the side it was on.
pub fn obstacle_avoidance(
    agent: &AgentSnapshot,
    obstacles: &[ObstacleSnapshot],
    avoidance_range: f32,
    sides: &mut Vec<(Entity, Side)>,
) -> Vec3 {
    let right = agent.right();
    let mut force = Vec3::ZERO;

    for obstacle in obstacles {
        let to_obstacle = planar(obstacle.position - agent.position);
        if to_obstacle.dot(agent.velocity) <= 0.0 {
            continue;
        }
        let distance = to_obstacle.length();
        let detection = avoidance_range + obstacle.radius;
        if distance > detection {
            continue;
        }
        let touch = agent.radius + obstacle.radius;
        let lateral = to_obstacle.dot(right);
        if lateral.abs() > touch {
            continue;
        }

        let side = if lateral >= 0.0 { Side::Right } else { Side::Left };
        sides.push((obstacle.entity, side));

        let proximity = remap(distance, touch, detection, 1.0, 0.0).clamp(0.0, 1.0);
        let away = match side {
            Side::Right => -right,
            Side::Left => right,
        };
        force += away * agent.max_speed * proximity;
    }
    force
}

// ============================================================================
// BOUNDARY EVASION
// ============================================================================

/// Fraction of `max_speed` an agent already past an edge always steers back in.
const OUTSIDE_PULL: f32 = 0.5;

/// Corrective force when the position `time_coeff` seconds ahead leaves `bounds`.
///
/// Offending velocity components are turned inward; the seek-style correction
/// is divided by the distance to the nearest offending edge (clamped to
/// `EPSILON`). Exactly zero when the prediction stays inside. An agent whose
/// current position is already past an edge gets an inward component of at
/// least `OUTSIDE_PULL * max_speed` on that axis, so sliding along the outside
/// of a wall is still corrected.
pub fn boundary_evasion(agent: &AgentSnapshot, bounds: &WorldBounds, time_coeff: f32) -> Vec3 {
    let p = agent.position;
    let future = p + agent.velocity * time_coeff;
    let pull = agent.max_speed * OUTSIDE_PULL;
    let mut desired = planar(agent.velocity);
    let mut edge_distance = f32::INFINITY;
    let mut crossed = false;

    if future.x > bounds.max.x {
        desired.x = -desired.x.abs();
        if p.x > bounds.max.x {
            desired.x = desired.x.min(-pull);
        }
        edge_distance = edge_distance.min(bounds.max.x - p.x);
        crossed = true;
    } else if future.x < bounds.min.x {
        desired.x = desired.x.abs();
        if p.x < bounds.min.x {
            desired.x = desired.x.max(pull);
        }
        edge_distance = edge_distance.min(p.x - bounds.min.x);
        crossed = true;
    }
    if future.z > bounds.max.y {
        desired.z = -desired.z.abs();
        if p.z > bounds.max.y {
            desired.z = desired.z.min(-pull);
        }
        edge_distance = edge_distance.min(bounds.max.y - p.z);
        crossed = true;
    } else if future.z < bounds.min.y {
        desired.z = desired.z.abs();
        if p.z < bounds.min.y {
            desired.z = desired.z.max(pull);
        }
        edge_distance = edge_distance.min(p.z - bounds.min.y);
        crossed = true;
    }

    if !crossed {
        return Vec3::ZERO;
    }

    // At rest with no speed to pull with; head for the centre.
    let heading = desired
        .try_normalize()
        .unwrap_or_else(|| planar(bounds.center() - p).normalize_or_zero());
    (heading * agent.max_speed - agent.velocity) / edge_distance.max(EPSILON)
}
