//! Power-to-speed simulation.

pub mod physics;
pub mod simulator;
pub mod types;

pub use physics::{tick, PhysicsParams};
pub use simulator::{SpeedSimulator, UPDATE_INTERVAL};
pub use types::{PowerSample, SimulationState, TickOutput};
