//! WattSpeed - Virtual Speed Sensor for Indoor Rides
//!
//! Registers a virtual speed sensor with the host cycling computer and, while
//! an indoor ride profile is active, simulates road speed and distance from
//! the rider's measured power using a simplified physics model.

pub mod device;
pub mod host;
pub mod simulation;
pub mod status;
pub mod storage;

// Re-export commonly used types
pub use device::{DeviceConnection, DeviceEvent, WattSpeedExtension};
pub use host::{HostService, LocalHost};
pub use simulation::SpeedSimulator;
pub use status::StatusMonitor;
pub use storage::config::AppConfig;
