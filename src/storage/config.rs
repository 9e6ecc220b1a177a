//! Application configuration.
//!
//! Loaded from `config.toml` in the application data directory; a missing
//! file yields the defaults, which reproduce the reference sensor behaviour.

use crate::simulation::physics::{
    PhysicsParams, AIR_DENSITY, BIKE_MASS, COASTING_DECELERATION, DEFAULT_CDA, DEFAULT_CRR,
    GRAVITY, MAX_ACCELERATION,
};
use crate::simulation::simulator::UPDATE_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Simulation settings
    pub simulation: SimulationSettings,
    /// Device settings
    pub device: DeviceSettings,
    /// Headless runner script
    pub demo: DemoSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            simulation: SimulationSettings::default(),
            device: DeviceSettings::default(),
            demo: DemoSettings::default(),
        }
    }
}

/// Simulation-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Tick interval in milliseconds
    pub update_interval_ms: u64,
    /// Acceleration bound in m/s²
    pub max_acceleration: f64,
    /// Seconds without positive power before coasting applies
    pub coasting_threshold_secs: f64,
    /// Coasting deceleration in m/s²
    pub coasting_deceleration: f64,
    /// Air density in kg/m³
    pub air_density: f64,
    /// Gravity in m/s²
    pub gravity: f64,
    /// Rolling resistance coefficient
    pub rolling_resistance: f64,
    /// Drag area (CdA) in m²
    pub drag_area: f64,
    /// Bike mass in kg
    pub bike_mass_kg: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: UPDATE_INTERVAL.as_millis() as u64,
            max_acceleration: MAX_ACCELERATION,
            coasting_threshold_secs: 3.0,
            coasting_deceleration: COASTING_DECELERATION,
            air_density: AIR_DENSITY,
            gravity: GRAVITY,
            rolling_resistance: DEFAULT_CRR,
            drag_area: DEFAULT_CDA,
            bike_mass_kg: BIKE_MASS,
        }
    }
}

impl SimulationSettings {
    /// Tick interval; a zero interval falls back to the default.
    pub fn update_interval(&self) -> Duration {
        if self.update_interval_ms == 0 {
            UPDATE_INTERVAL
        } else {
            Duration::from_millis(self.update_interval_ms)
        }
    }

    /// Model parameters for the simulator.
    pub fn physics(&self) -> PhysicsParams {
        let defaults = PhysicsParams::default();
        let coasting_threshold = Duration::try_from_secs_f64(self.coasting_threshold_secs)
            .unwrap_or(defaults.coasting_threshold);

        PhysicsParams {
            air_density: self.air_density,
            gravity: self.gravity,
            crr: self.rolling_resistance,
            cda: self.drag_area,
            bike_mass_kg: self.bike_mass_kg,
            max_acceleration: self.max_acceleration,
            coasting_threshold,
            coasting_deceleration: self.coasting_deceleration,
        }
    }
}

/// Device-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Period of the discovery broadcast in milliseconds
    pub scan_interval_ms: u64,
    /// How long the status model waits for the host before reporting it missing
    pub host_connection_grace_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            scan_interval_ms: 1_000,
            host_connection_grace_ms: 1_000,
        }
    }
}

impl DeviceSettings {
    /// Discovery broadcast period.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(1))
    }

    /// Grace period before the host counts as not connected.
    pub fn host_connection_grace(&self) -> Duration {
        Duration::from_millis(self.host_connection_grace_ms)
    }
}

/// One segment of the scripted power profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSegment {
    /// Segment length in seconds
    pub duration_secs: f64,
    /// Power held during the segment, watts
    pub watts: f64,
}

/// Script replayed by the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Rider weight in kg
    pub rider_weight_kg: f64,
    /// Ride profile name
    pub profile_name: String,
    /// Whether the ride profile is indoor
    pub indoor: bool,
    /// Power segments in order
    pub segments: Vec<PowerSegment>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            rider_weight_kg: 75.0,
            profile_name: "Indoor".to_string(),
            indoor: true,
            segments: vec![
                PowerSegment {
                    duration_secs: 10.0,
                    watts: 150.0,
                },
                PowerSegment {
                    duration_secs: 20.0,
                    watts: 250.0,
                },
                PowerSegment {
                    duration_secs: 8.0,
                    watts: 0.0,
                },
            ],
        }
    }
}

impl DemoSettings {
    /// Total scripted duration in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.duration_secs.max(0.0))
            .sum()
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "wattspeed", "WattSpeed")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from a file; a missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
