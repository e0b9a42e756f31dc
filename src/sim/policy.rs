// Behaviour policies: which steering forces an agent sums each tick.
//
// Both roles share the same kinematic core; the policy only decides the net
// force. Zombies with nobody left to chase switch to homing on the origin.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;

use crate::config::{HumanConfig, HumanWeights, SteeringConfig, ZombieConfig, ZombieWeights};
use crate::engine::components::{SteeringDebug, Wander, WorldBounds};
use crate::engine::math::{clamp_magnitude, planar, planar_distance};
use crate::engine::steering::{self, AgentSnapshot, ObstacleSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Human,
    Zombie,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanPolicy {
    pub detection_range: f32,
    pub separation_radius: f32,
    pub prediction_factor: f32,
    pub weights: HumanWeights,
}

impl From<&HumanConfig> for HumanPolicy {
    fn from(config: &HumanConfig) -> Self {
        Self {
            detection_range: config.detection_range,
            separation_radius: config.separation_radius,
            prediction_factor: config.prediction_factor,
            weights: config.weights,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZombiePolicy {
    pub separation_radius: f32,
    pub prediction_factor: f32,
    pub slow_radius: f32,
    pub stop_radius: f32,
    pub park_tolerance: f32,
    pub weights: ZombieWeights,
}

impl From<&ZombieConfig> for ZombiePolicy {
    fn from(config: &ZombieConfig) -> Self {
        Self {
            separation_radius: config.separation_radius,
            prediction_factor: config.prediction_factor,
            slow_radius: config.slow_radius,
            stop_radius: config.stop_radius,
            park_tolerance: config.park_tolerance,
            weights: config.weights,
        }
    }
}

/// Per-agent behaviour, tagged by role.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    Human(HumanPolicy),
    Zombie(ZombiePolicy),
}

impl Policy {
    pub fn role(&self) -> Role {
        match self {
            Policy::Human(_) => Role::Human,
            Policy::Zombie(_) => Role::Zombie,
        }
    }
}

/// Read-only world view handed to every policy during the force phase.
pub struct SteeringContext<'a> {
    pub humans: &'a [AgentSnapshot],
    pub zombies: &'a [AgentSnapshot],
    pub obstacles: &'a [ObstacleSnapshot],
    pub bounds: &'a WorldBounds,
    pub steering: &'a SteeringConfig,
    pub treasure: Option<Vec3>,
    pub dt: f32,
}

/// What the force phase should do with an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steer {
    /// Apply this net force (already clamped to max force).
    Force(Vec3),
    /// Snap onto this point and stop.
    Park(Vec3),
}

/// Mutable per-agent state a policy may touch.
pub struct AgentScratch<'a> {
    pub wander: &'a mut Wander,
    pub debug: &'a mut SteeringDebug,
}

impl Policy {
    pub fn steer<R: Rng + ?Sized>(
        &self,
        agent: &AgentSnapshot,
        max_force: f32,
        scratch: AgentScratch<'_>,
        ctx: &SteeringContext<'_>,
        rng: &mut R,
    ) -> Steer {
        scratch.debug.obstacle_sides.clear();
        scratch.debug.future_position = None;
        scratch.debug.target = None;
        match self {
            Policy::Human(p) => Steer::Force(clamp_magnitude(
                p.net_force(agent, scratch, ctx, rng),
                max_force,
            )),
            Policy::Zombie(p) => p.steer(agent, max_force, scratch.debug, ctx),
        }
    }
}

impl HumanPolicy {
    fn net_force<R: Rng + ?Sized>(
        &self,
        agent: &AgentSnapshot,
        scratch: AgentScratch<'_>,
        ctx: &SteeringContext<'_>,
        rng: &mut R,
    ) -> Vec3 {
        let w = &self.weights;
        let mut net = Vec3::ZERO;

        net += steering::obstacle_avoidance(
            agent,
            ctx.obstacles,
            ctx.steering.avoidance_range,
            &mut scratch.debug.obstacle_sides,
        ) * w.obstacle_avoidance;
        net += steering::boundary_evasion(agent, ctx.bounds, ctx.steering.boundary_time_coeff)
            * w.boundary_evasion;

        let mut threatened = false;
        for zombie in ctx.zombies {
            if planar_distance(agent.position, zombie.position) < self.detection_range {
                net += steering::evade(agent, zombie, self.prediction_factor) * w.evade;
                threatened = true;
            }
        }
        if !threatened {
            net += steering::wander(agent, scratch.wander, ctx.steering, ctx.dt, rng) * w.wander;
        }

        if let Some(treasure) = ctx.treasure {
            net += steering::seek(agent, treasure) * w.seek_treasure;
        }

        net += steering::separation(agent, ctx.humans, self.separation_radius) * w.separation;
        net
    }
}

impl ZombiePolicy {
    fn steer(
        &self,
        agent: &AgentSnapshot,
        max_force: f32,
        debug: &mut SteeringDebug,
        ctx: &SteeringContext<'_>,
    ) -> Steer {
        let Some(target) = nearest(agent, ctx.humans) else {
            return self.home(agent, max_force);
        };

        let w = &self.weights;
        let future = steering::predict(target, self.prediction_factor);
        debug.future_position = Some(future);
        debug.target = Some(target.entity);

        let mut net = Vec3::ZERO;
        net += steering::obstacle_avoidance(
            agent,
            ctx.obstacles,
            ctx.steering.avoidance_range,
            &mut debug.obstacle_sides,
        ) * w.obstacle_avoidance;
        net += steering::pursue(agent, target, self.prediction_factor) * w.pursue;
        net += steering::boundary_evasion(agent, ctx.bounds, self.prediction_factor)
            * w.boundary_evasion;
        net += steering::separation(agent, ctx.zombies, self.separation_radius) * w.separation;
        Steer::Force(clamp_magnitude(net, max_force))
    }

    /// No humans left: arrive at the origin, parking once close enough.
    fn home(&self, agent: &AgentSnapshot, max_force: f32) -> Steer {
        let origin = Vec3::ZERO;
        if planar(origin - agent.position).length() <= self.park_tolerance {
            return Steer::Park(origin);
        }
        let force = steering::arrive(agent, origin, self.slow_radius, self.stop_radius);
        Steer::Force(clamp_magnitude(force, max_force))
    }
}

/// Closest agent by planar distance. Ties keep the first one encountered.
pub fn nearest<'a>(agent: &AgentSnapshot, candidates: &'a [AgentSnapshot]) -> Option<&'a AgentSnapshot> {
    let mut best: Option<(&AgentSnapshot, f32)> = None;
    for candidate in candidates {
        let d = planar_distance(agent.position, candidate.position);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn snapshot(id: u32, position: Vec3, velocity: Vec3) -> AgentSnapshot {
        AgentSnapshot {
            entity: Entity::from_raw(id),
            position,
            velocity,
            direction: velocity.try_normalize().unwrap_or(Vec3::X),
            radius: 1.0,
            max_speed: 1.0,
        }
    }

    fn context<'a>(
        humans: &'a [AgentSnapshot],
        zombies: &'a [AgentSnapshot],
        bounds: &'a WorldBounds,
        steering: &'a SteeringConfig,
    ) -> SteeringContext<'a> {
        SteeringContext {
            humans,
            zombies,
            obstacles: &[],
            bounds,
            steering,
            treasure: None,
            dt: 1.0 / 60.0,
        }
    }

    fn big_bounds() -> WorldBounds {
        WorldBounds::new(Vec2::splat(-100.0), Vec2::splat(100.0))
    }

    #[test]
    fn nearest_prefers_first_on_ties() {
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let a = snapshot(1, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        let b = snapshot(2, Vec3::new(-2.0, 0.0, 0.0), Vec3::ZERO);
        let c = snapshot(3, Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(nearest(&me, &[c, a, b]).map(|s| s.entity), Some(a.entity));
        assert!(nearest(&me, &[]).is_none());
    }

    #[test]
    fn nearest_ignores_height() {
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let tall = snapshot(1, Vec3::new(1.0, 50.0, 0.0), Vec3::ZERO);
        let low = snapshot(2, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(nearest(&me, &[low, tall]).map(|s| s.entity), Some(tall.entity));
    }

    #[test]
    fn zombie_pursues_and_records_target() {
        let policy = ZombiePolicy::from(&ZombieConfig::default());
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let human = snapshot(1, Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);
        let (bounds, steering) = (big_bounds(), SteeringConfig::default());
        let humans = [human];
        let zombies = [me];
        let ctx = context(&humans, &zombies, &bounds, &steering);
        let mut debug = SteeringDebug::default();
        match policy.steer(&me, 1.0, &mut debug, &ctx) {
            Steer::Force(f) => {
                assert!(f.x > 0.0);
                assert!(f.length() <= 1.0 + 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(debug.target, Some(human.entity));
        assert_eq!(debug.future_position, Some(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn zombie_without_humans_homes_then_parks() {
        let policy = ZombiePolicy::from(&ZombieConfig::default());
        let (bounds, steering) = (big_bounds(), SteeringConfig::default());
        let ctx = context(&[], &[], &bounds, &steering);
        let mut debug = SteeringDebug::default();

        let far = snapshot(0, Vec3::new(6.0, 0.0, 8.0), Vec3::ZERO);
        match policy.steer(&far, 4.0, &mut debug, &ctx) {
            Steer::Force(f) => assert!(f.x < 0.0 && f.z < 0.0),
            other => panic!("unexpected {other:?}"),
        }

        let close = snapshot(0, Vec3::new(0.01, 0.0, 0.0), Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(policy.steer(&close, 4.0, &mut debug, &ctx), Steer::Park(Vec3::ZERO));
    }

    #[test]
    fn human_evades_zombie_in_range() {
        let policy = Policy::Human(HumanPolicy::from(&HumanConfig::default()));
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let zombie = snapshot(1, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        let (bounds, steering) = (big_bounds(), SteeringConfig::default());
        let humans = [me];
        let zombies = [zombie];
        let ctx = context(&humans, &zombies, &bounds, &steering);
        let mut wander = Wander::default();
        let mut debug = SteeringDebug::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let scratch = AgentScratch {
            wander: &mut wander,
            debug: &mut debug,
        };
        match policy.steer(&me, 10.0, scratch, &ctx, &mut rng) {
            Steer::Force(f) => assert!(f.x < 0.0),
            other => panic!("unexpected {other:?}"),
        }
        // Evading, so the wander timer did not advance.
        assert_eq!(wander.timer, 0.0);
    }

    #[test]
    fn human_wanders_when_safe() {
        let policy = Policy::Human(HumanPolicy::from(&HumanConfig::default()));
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let zombie = snapshot(1, Vec3::new(50.0, 0.0, 0.0), Vec3::ZERO);
        let (bounds, steering) = (big_bounds(), SteeringConfig::default());
        let humans = [me];
        let zombies = [zombie];
        let ctx = context(&humans, &zombies, &bounds, &steering);
        let mut wander = Wander::default();
        let mut debug = SteeringDebug::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let scratch = AgentScratch {
            wander: &mut wander,
            debug: &mut debug,
        };
        let outcome = policy.steer(&me, 1.0, scratch, &ctx, &mut rng);
        assert!(matches!(outcome, Steer::Force(f) if f.length() <= 1.0 + 1e-6));
        assert!(wander.timer > 0.0);
    }

    #[test]
    fn human_net_force_includes_treasure_seek() {
        let mut config = HumanConfig::default();
        config.weights.seek_treasure = 2.0;
        let policy = Policy::Human(HumanPolicy::from(&config));
        let me = snapshot(0, Vec3::ZERO, Vec3::ZERO);
        let (bounds, steering) = (big_bounds(), SteeringConfig::default());
        let humans = [me];

        let steer_with = |treasure: Option<Vec3>| {
            let mut ctx = context(&humans, &[], &bounds, &steering);
            ctx.treasure = treasure;
            let mut wander = Wander::default();
            let mut debug = SteeringDebug::default();
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let scratch = AgentScratch {
                wander: &mut wander,
                debug: &mut debug,
            };
            match policy.steer(&me, 100.0, scratch, &ctx, &mut rng) {
                Steer::Force(f) => f,
                other => panic!("unexpected {other:?}"),
            }
        };

        let without = steer_with(None);
        let with = steer_with(Some(Vec3::new(0.0, 0.0, 20.0)));
        // Same seed, same wander: the difference is the weighted seek alone.
        let seek_term = with - without;
        assert!((seek_term - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5, "{seek_term}");
    }
}
