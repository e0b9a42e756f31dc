use std::collections::HashSet;

use glam::Vec3;
use hvz_sugar::config::BoundaryMode;
use hvz_sugar::engine::Side;
use hvz_sugar::{Role, SimConfig, Simulation};

fn empty_config() -> SimConfig {
    SimConfig {
        num_humans: 0,
        num_zombies: 0,
        num_obstacles: 0,
        ..SimConfig::default()
    }
}

fn empty_sim() -> Simulation {
    Simulation::new(empty_config()).unwrap()
}

#[test]
fn zombie_pursues_human_along_x() {
    let mut config = empty_config();
    config.zombie.body.max_speed = 1.0;
    config.zombie.body.max_force = 1.0;
    config.zombie.body.mass = 1.0;
    let mut sim = Simulation::new(config).unwrap();
    let zombie = sim.spawn_zombie(Vec3::ZERO);
    sim.spawn_human(Vec3::new(3.0, 0.0, 0.0));

    sim.tick(1.0);

    let z = sim.agent(zombie).unwrap();
    assert!(z.velocity.x > 0.0);
    assert!(z.velocity.length() <= 1.0 + 1e-5);
    assert!(sim.debug(zombie).unwrap().target.is_some());
}

#[test]
fn touching_human_converts_within_the_same_tick() {
    let mut sim = empty_sim();
    sim.spawn_zombie(Vec3::ZERO);
    let human = sim.spawn_human(Vec3::new(1.5, 0.0, 0.0));
    let human_pos = sim.agent(human).unwrap().position;

    sim.tick(1e-3);

    assert_eq!(sim.human_count(), 0);
    assert_eq!(sim.zombie_count(), 2);
    assert!(sim.agent(human).is_none());
    let converted = sim
        .zombies()
        .into_iter()
        .map(|z| z.position)
        .any(|p| (p - human_pos).length() < 1e-2);
    assert!(converted);
    assert_eq!(sim.stats().conversions, 1);
}

#[test]
fn human_between_two_zombies_converts_once() {
    let mut sim = empty_sim();
    sim.spawn_zombie(Vec3::new(-1.0, 0.0, 0.0));
    sim.spawn_zombie(Vec3::new(1.0, 0.0, 0.0));
    sim.spawn_human(Vec3::ZERO);

    sim.tick(1e-3);

    assert_eq!(sim.human_count(), 0);
    assert_eq!(sim.zombie_count(), 3);
    assert_eq!(sim.stats().last_tick_conversions, 1);
}

#[test]
fn new_zombies_wait_a_tick_before_converting() {
    let mut sim = empty_sim();
    sim.spawn_zombie(Vec3::ZERO);
    // Touches the zombie.
    sim.spawn_human(Vec3::new(1.5, 0.0, 0.0));
    // Only touches the first human.
    sim.spawn_human(Vec3::new(3.2, 0.0, 0.0));

    sim.tick(1e-3);
    assert_eq!(sim.human_count(), 1);
    assert_eq!(sim.zombie_count(), 2);

    sim.tick(1e-3);
    assert_eq!(sim.human_count(), 0);
    assert_eq!(sim.zombie_count(), 3);
}

#[test]
fn agents_outside_bounds_still_convert() {
    let mut sim = empty_sim();
    sim.spawn_zombie(Vec3::new(40.0, 0.0, 40.0));
    sim.spawn_human(Vec3::new(41.0, 0.0, 40.5));
    sim.tick(1e-3);
    assert_eq!(sim.human_count(), 0);
}

#[test]
fn rosters_stay_partitioned_and_forces_clamped() {
    let config = SimConfig {
        num_humans: 20,
        num_zombies: 6,
        ..SimConfig::default()
    };
    let max_force = config.human.body.max_force.max(config.zombie.body.max_force);
    let total = config.num_humans + config.num_zombies;
    let dt = config.dt;
    let mut sim = Simulation::new(config).unwrap();

    for _ in 0..600 {
        sim.tick(dt);

        let humans: HashSet<_> = sim.humans().into_iter().map(|a| a.entity).collect();
        let zombies: HashSet<_> = sim.zombies().into_iter().map(|a| a.entity).collect();
        let vehicles = sim.vehicles();
        let all: HashSet<_> = vehicles.iter().map(|a| a.entity).collect();

        assert!(humans.is_disjoint(&zombies));
        assert_eq!(&humans | &zombies, all);
        assert_eq!(all.len(), total);
        for v in &vehicles {
            assert!(v.applied_force.length() <= max_force + 1e-4);
            assert!(v.position.is_finite());
        }
    }
    assert_eq!(sim.stats().ticks, 600);
}

#[test]
fn same_seed_same_trajectories() {
    let run = || {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        for _ in 0..240 {
            sim.tick(1.0 / 60.0);
        }
        let mut positions: Vec<_> = sim
            .vehicles()
            .into_iter()
            .map(|a| (a.role == Role::Zombie, a.position.to_array()))
            .collect();
        positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
        positions
    };
    assert_eq!(run(), run());
}

#[test]
fn lone_zombie_heads_home_and_parks() {
    let mut sim = empty_sim();
    let far = sim.spawn_zombie(Vec3::new(5.0, 0.0, 0.0));
    let near = sim.spawn_zombie(Vec3::new(0.04, 0.0, 0.0));

    for _ in 0..30 {
        sim.tick(1.0 / 60.0);
    }

    let far_view = sim.agent(far).unwrap();
    assert!(far_view.position.x < 5.0);
    let near_view = sim.agent(near).unwrap();
    assert_eq!(near_view.position.x, 0.0);
    assert_eq!(near_view.position.z, 0.0);
    assert_eq!(near_view.velocity, Vec3::ZERO);
}

#[test]
fn debug_flag_is_shared_by_new_zombies() {
    let mut sim = empty_sim();
    let first = sim.spawn_zombie(Vec3::ZERO);
    assert!(!sim.agent(first).unwrap().debug);

    assert!(sim.toggle_debug());
    let placed = sim.spawn_zombie(Vec3::new(10.0, 0.0, 0.0));
    // A human touching the first zombie becomes a zombie during the next tick.
    sim.spawn_human(Vec3::new(0.5, 0.0, 0.0));
    sim.tick(1.0 / 60.0);
    assert_eq!(sim.human_count(), 0);

    let zombies = sim.zombies();
    assert_eq!(zombies.len(), 3);
    assert!(zombies.iter().all(|z| z.debug));
    assert!(sim.agent(placed).unwrap().debug);

    assert!(!sim.toggle_debug());
    assert!(sim.vehicles().iter().all(|v| !v.debug));
}

#[test]
fn placement_uses_role_spawn_height() {
    let mut config = empty_config();
    config.human.body.spawn_height = 0.5;
    config.zombie.body.spawn_height = 0.75;
    let mut sim = Simulation::new(config).unwrap();
    let h = sim.spawn_human(Vec3::new(1.0, 9.0, 2.0));
    let z = sim.spawn_zombie(Vec3::new(10.0, -3.0, 2.0));
    assert_eq!(sim.agent(h).unwrap().position, Vec3::new(1.0, 0.5, 2.0));
    assert_eq!(sim.agent(z).unwrap().position, Vec3::new(10.0, 0.75, 2.0));

    // Height never drifts.
    for _ in 0..60 {
        sim.tick(1.0 / 60.0);
    }
    for v in sim.vehicles() {
        let expected = if v.role == Role::Human { 0.5 } else { 0.75 };
        assert_eq!(v.position.y, expected);
    }
}

#[test]
fn obstacles_are_listed_and_avoided() {
    let mut sim = empty_sim();
    let rock = sim.spawn_obstacle(Vec3::new(0.3, 0.0, 4.0), 1.5);
    let zombie = sim.spawn_zombie(Vec3::ZERO);
    sim.spawn_human(Vec3::new(0.0, 0.0, 12.0));

    assert_eq!(sim.obstacles().len(), 1);
    assert_eq!(sim.obstacles()[0].entity, rock);

    // First tick gets the zombie moving toward the human; the second sees the
    // rock ahead and slightly to the right.
    sim.tick(1.0 / 60.0);
    assert!(sim.debug(zombie).unwrap().obstacle_sides.is_empty());
    sim.tick(1.0 / 60.0);
    let sides = sim.debug(zombie).unwrap().obstacle_sides.clone();
    assert_eq!(sides, vec![(rock, Side::Right)]);
    assert!(sim.agent(zombie).unwrap().applied_force.x < 0.0);
}

#[test]
fn invalid_dt_is_ignored() {
    let mut sim = empty_sim();
    let z = sim.spawn_zombie(Vec3::new(5.0, 0.0, 0.0));
    sim.tick(0.0);
    sim.tick(f32::NAN);
    sim.tick(-1.0);
    assert_eq!(sim.stats().ticks, 0);
    assert_eq!(sim.agent(z).unwrap().position.x, 5.0);
}

#[test]
fn bounce_mode_keeps_agents_on_the_floor() {
    let config = SimConfig {
        boundary_mode: BoundaryMode::Bounce,
        ..empty_config()
    };
    let max_x = config.bounds_max.x;
    let mut sim = Simulation::new(config).unwrap();
    let h = sim.spawn_human(Vec3::new(max_x + 5.0, 0.0, 0.0));
    sim.tick(1.0 / 60.0);
    assert!(sim.agent(h).unwrap().position.x <= max_x);
}

#[test]
fn grabbed_treasure_relocates() {
    let mut sim = empty_sim();
    sim.spawn_human(Vec3::ZERO);
    sim.set_treasure(Vec3::new(0.2, 0.0, 0.0));
    sim.tick(1.0 / 60.0);
    let moved = sim.treasure().unwrap();
    assert_ne!(moved, Vec3::new(0.2, 0.0, 0.0));
    assert!(sim.bounds().contains(moved));
}

#[test]
fn random_population_respects_config() {
    let config = SimConfig {
        num_humans: 7,
        num_zombies: 3,
        num_obstacles: 4,
        treasure: true,
        ..SimConfig::default()
    };
    let sim = Simulation::new(config).unwrap();
    assert_eq!(sim.human_count(), 7);
    assert_eq!(sim.zombie_count(), 3);
    assert_eq!(sim.obstacles().len(), 4);
    assert!(sim.treasure().is_some());
    let bounds = sim.bounds();
    for v in sim.vehicles() {
        assert!(bounds.contains(v.position));
    }
    for o in sim.obstacles() {
        assert!((1.0..=2.0).contains(&o.radius));
    }
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = empty_config();
    config.zombie.slow_radius = 0.0;
    assert!(Simulation::new(config).is_err());
}

#[test]
fn oversized_grid_is_rejected_before_allocation() {
    let config = SimConfig {
        bounds_min: glam::Vec2::splat(-1e6),
        bounds_max: glam::Vec2::splat(1e6),
        ..empty_config()
    };
    assert!(Simulation::new(config).is_err());
}

#[test]
fn read_only_accessors_track_spawns_and_despawns() {
    let mut sim = empty_sim();
    assert!(sim.vehicles().is_empty());
    assert!(sim.obstacles().is_empty());

    let rock = sim.spawn_obstacle(Vec3::new(-8.0, 0.0, -8.0), 1.0);
    sim.spawn_zombie(Vec3::ZERO);
    let human = sim.spawn_human(Vec3::new(0.5, 0.0, 0.0));
    assert_eq!(sim.obstacles().len(), 1);
    assert_eq!((sim.human_count(), sim.zombie_count()), (1, 1));
    assert!(sim.agent(rock).is_none());

    sim.tick(1.0 / 60.0);
    let view: &Simulation = &sim;
    assert!(view.agent(human).is_none());
    assert_eq!((view.human_count(), view.zombie_count()), (0, 2));
    assert_eq!(view.vehicles().len(), 2);
}
