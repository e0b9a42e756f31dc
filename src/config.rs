use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::spatial::{MAX_GRID_CELLS, SpatialGrid};

/// How agents are kept inside the playfield.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Predictive soft force only.
    #[default]
    Evade,
    /// Soft force plus a hard clamp that reflects velocity at the edge.
    Bounce,
}

/// Physical parameters shared by every agent of one role.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    pub mass: f32,
    pub radius: f32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Y coordinate agents of this role are placed at.
    pub spawn_height: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            radius: 1.0,
            max_speed: 3.0,
            max_force: 4.0,
            spawn_height: 1.0,
        }
    }
}

/// Multipliers for each force a human sums.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HumanWeights {
    pub obstacle_avoidance: f32,
    pub boundary_evasion: f32,
    pub evade: f32,
    pub wander: f32,
    pub separation: f32,
    /// Only used when a treasure exists.
    pub seek_treasure: f32,
}

impl Default for HumanWeights {
    fn default() -> Self {
        Self {
            obstacle_avoidance: 5.0,
            boundary_evasion: 1.0,
            evade: 1.0,
            wander: 1.0,
            separation: 1.0,
            seek_treasure: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HumanConfig {
    pub body: BodyConfig,
    /// Zombies closer than this (planar) are evaded.
    pub detection_range: f32,
    pub separation_radius: f32,
    /// Seconds of linear extrapolation used when evading.
    pub prediction_factor: f32,
    pub weights: HumanWeights,
}

impl Default for HumanConfig {
    fn default() -> Self {
        Self {
            body: BodyConfig::default(),
            detection_range: 5.0,
            separation_radius: 2.5,
            prediction_factor: 1.0,
            weights: HumanWeights::default(),
        }
    }
}

/// Multipliers for each force a zombie sums while humans remain.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZombieWeights {
    pub obstacle_avoidance: f32,
    pub pursue: f32,
    pub boundary_evasion: f32,
    pub separation: f32,
}

impl Default for ZombieWeights {
    fn default() -> Self {
        Self {
            obstacle_avoidance: 5.0,
            pursue: 1.0,
            boundary_evasion: 1.0,
            separation: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZombieConfig {
    pub body: BodyConfig,
    pub separation_radius: f32,
    /// Seconds of linear extrapolation for pursuit and boundary prediction.
    pub prediction_factor: f32,
    /// Arrive slows down inside this distance of the origin.
    pub slow_radius: f32,
    /// Arrive wants zero speed inside this distance.
    pub stop_radius: f32,
    /// Distance at which a homing zombie snaps onto the origin.
    pub park_tolerance: f32,
    pub weights: ZombieWeights,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            body: BodyConfig {
                max_speed: 2.5,
                ..BodyConfig::default()
            },
            separation_radius: 2.5,
            prediction_factor: 1.0,
            slow_radius: 10.0,
            stop_radius: 0.0,
            park_tolerance: 0.05,
            weights: ZombieWeights::default(),
        }
    }
}

/// Tuning shared by every agent regardless of role.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SteeringConfig {
    /// Look-ahead distance for obstacle avoidance, added to the obstacle radius.
    pub avoidance_range: f32,
    /// Seconds of look-ahead for the human boundary prediction.
    pub boundary_time_coeff: f32,
    /// Seconds between full wander-angle resamples.
    pub wander_period: f32,
    /// Resampled angles are drawn from `[-range, range]` radians.
    pub wander_angle_range: f32,
    /// Per-tick jitter drawn from `[-jitter, jitter]` radians.
    pub wander_jitter: f32,
    pub wander_radius: f32,
    /// Distance ahead of the agent where the wander circle sits.
    pub wander_offset: f32,
    /// Rate (1/s) at which the rendered heading eases toward the velocity.
    pub orientation_smoothing: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            avoidance_range: 4.0,
            boundary_time_coeff: 1.0,
            wander_period: 1.0,
            wander_angle_range: std::f32::consts::PI,
            wander_jitter: 0.3,
            wander_radius: 1.0,
            wander_offset: 2.0,
            orientation_smoothing: 8.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for placement and wandering.
    pub seed: u64,
    /// Playfield minimum corner (x, z).
    pub bounds_min: Vec2,
    /// Playfield maximum corner (x, z).
    pub bounds_max: Vec2,
    pub num_humans: usize,
    pub num_zombies: usize,
    pub num_obstacles: usize,
    pub obstacle_radius_min: f32,
    pub obstacle_radius_max: f32,
    pub obstacle_height: f32,
    pub human: HumanConfig,
    pub zombie: ZombieConfig,
    pub steering: SteeringConfig,
    pub boundary_mode: BoundaryMode,
    /// Spawn a treasure that humans seek.
    pub treasure: bool,
    pub debug_enabled: bool,
    /// Cell size of the conversion broad-phase grid.
    pub grid_cell_size: f32,
    /// Fixed step used by the headless runner.
    pub dt: f32,
    /// Number of ticks the headless runner simulates.
    pub run_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            bounds_min: Vec2::new(-25.0, -25.0),
            bounds_max: Vec2::new(25.0, 25.0),
            num_humans: 10,
            num_zombies: 5,
            num_obstacles: 6,
            obstacle_radius_min: 1.0,
            obstacle_radius_max: 2.0,
            obstacle_height: 0.0,
            human: HumanConfig::default(),
            zombie: ZombieConfig::default(),
            steering: SteeringConfig::default(),
            boundary_mode: BoundaryMode::default(),
            treasure: false,
            debug_enabled: false,
            grid_cell_size: 4.0,
            dt: 1.0 / 60.0,
            run_ticks: 600,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimConfigError {
    #[error("world bounds must be finite with min < max on both axes")]
    InvalidBounds,
    #[error("{role} mass must be positive and finite")]
    InvalidMass { role: &'static str },
    #[error("{role} radius, max_speed and max_force must be non-negative and finite")]
    InvalidBody { role: &'static str },
    #[error("zombie slow_radius ({slow}) must be greater than stop_radius ({stop})")]
    InvalidArriveRadii { slow: f32, stop: f32 },
    #[error("wander_period must be positive and finite")]
    InvalidWanderPeriod,
    #[error("grid_cell_size must be positive and finite")]
    InvalidGridCellSize,
    #[error("bounds and grid_cell_size exceed {max} grid cells")]
    GridTooLarge { max: usize },
    #[error("obstacle radius range must satisfy 0 <= min <= max")]
    InvalidObstacleRadius,
    #[error("dt must be positive and finite")]
    InvalidDt,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] SimConfigError),
}

fn finite_non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn validate_body(body: &BodyConfig, role: &'static str) -> Result<(), SimConfigError> {
    if !(body.mass.is_finite() && body.mass > 0.0) {
        return Err(SimConfigError::InvalidMass { role });
    }
    if !(finite_non_negative(body.radius)
        && finite_non_negative(body.max_speed)
        && finite_non_negative(body.max_force))
    {
        return Err(SimConfigError::InvalidBody { role });
    }
    Ok(())
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        let (min, max) = (self.bounds_min, self.bounds_max);
        if !(min.is_finite() && max.is_finite() && min.x < max.x && min.y < max.y) {
            return Err(SimConfigError::InvalidBounds);
        }
        validate_body(&self.human.body, "human")?;
        validate_body(&self.zombie.body, "zombie")?;
        if !(self.zombie.slow_radius > self.zombie.stop_radius) {
            return Err(SimConfigError::InvalidArriveRadii {
                slow: self.zombie.slow_radius,
                stop: self.zombie.stop_radius,
            });
        }
        if !(self.steering.wander_period.is_finite() && self.steering.wander_period > 0.0) {
            return Err(SimConfigError::InvalidWanderPeriod);
        }
        if !(self.grid_cell_size.is_finite() && self.grid_cell_size > 0.0) {
            return Err(SimConfigError::InvalidGridCellSize);
        }
        let cells = SpatialGrid::cell_count(min, max, self.grid_cell_size);
        if cells.is_none_or(|n| n > MAX_GRID_CELLS) {
            return Err(SimConfigError::GridTooLarge { max: MAX_GRID_CELLS });
        }
        if !(finite_non_negative(self.obstacle_radius_min)
            && self.obstacle_radius_max.is_finite()
            && self.obstacle_radius_min <= self.obstacle_radius_max)
        {
            return Err(SimConfigError::InvalidObstacleRadius);
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimConfigError::InvalidDt);
        }
        Ok(())
    }
}
