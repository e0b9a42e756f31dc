// Engine module - steering and kinematics, independent of who is chasing whom.

pub mod components;
pub mod math;
pub mod spatial;
pub mod steering;
pub mod systems;
pub mod vehicle;

// Re-export commonly used items
pub use components::*;
