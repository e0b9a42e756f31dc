// Humans vs Zombies steering simulation.
//
// `engine` holds the role-agnostic steering and kinematics core; `sim` holds
// the two behaviour policies and the population manager that drives a tick.

pub mod config;
pub mod engine;
pub mod sim;

pub use config::{ConfigLoadError, SimConfig, SimConfigError};
pub use sim::{AgentView, ObstacleView, Simulation};
pub use sim::policy::Role;
