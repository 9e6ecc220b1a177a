//! Data model shared with the host platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host data type identifiers.
pub mod data_type {
    /// Rider power stream
    pub const POWER: &str = "TYPE_POWER_ID";
    /// Speed as shown by the host
    pub const SPEED: &str = "TYPE_SPEED_ID";
    /// Speed source channel a sensor can feed
    pub const SPEED_SOURCE: &str = "SOURCE_SPEED_ID";
    /// Speed derived from a power meter
    pub const POWER_SPEED: &str = "TYPE_POWER_SPEED_ID";
    /// Speed from a speed/cadence sensor
    pub const CSC_SPEED: &str = "TYPE_CSC_SPEED_ID";
    /// Speed from GPS
    pub const LOCATION_SPEED: &str = "TYPE_LOCATION_SPEED_ID";
}

/// Host data point field identifiers.
pub mod field {
    pub const SINGLE: &str = "FIELD_SINGLE_ID";
    pub const POWER: &str = "FIELD_POWER_ID";
    pub const SPEED: &str = "FIELD_SPEED_ID";
    pub const DISTANCE: &str = "FIELD_DISTANCE_ID";
}

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric units (km/h, kg, km)
    #[default]
    Metric,
    /// Imperial units (mph, lbs, miles)
    Imperial,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Metric => write!(f, "Metric"),
            Units::Imperial => write!(f, "Imperial"),
        }
    }
}

impl Units {
    /// Convert a speed in m/s to the preferred unit.
    pub fn convert_speed(&self, speed_ms: f64) -> (f64, &'static str) {
        match self {
            Units::Metric => (speed_ms * 3.6, "km/h"),
            Units::Imperial => (speed_ms * 2.23694, "mph"),
        }
    }
}

/// Rider profile as published by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Unit preference
    pub preferred_unit: Units,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            weight_kg: 75.0,
            preferred_unit: Units::Metric,
        }
    }
}

impl UserProfile {
    /// Create a metric profile with the given weight.
    pub fn with_weight(weight_kg: f64) -> Self {
        Self {
            weight_kg,
            ..Default::default()
        }
    }

    /// Whether the weight can drive a simulation.
    pub fn has_valid_weight(&self) -> bool {
        self.weight_kg.is_finite() && self.weight_kg > 0.0
    }
}

/// The ride profile currently selected on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRideProfile {
    /// Human-readable profile name
    pub name: String,
    /// Whether the profile is flagged as an indoor (trainer) ride
    pub indoor: bool,
}

impl ActiveRideProfile {
    /// Create a ride profile.
    pub fn new(name: impl Into<String>, indoor: bool) -> Self {
        Self {
            name: name.into(),
            indoor,
        }
    }
}

/// A named, timestamped set of values handed to or received from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Data type identifier
    pub data_type_id: String,
    /// Field values
    pub values: BTreeMap<String, f64>,
    /// Device that produced the point, if any
    pub source_id: Option<String>,
    /// When the point was produced
    pub timestamp: DateTime<Utc>,
}

impl DataPoint {
    /// Create a data point with a single field.
    pub fn single(
        data_type_id: impl Into<String>,
        field_id: impl Into<String>,
        value: f64,
        source_id: Option<String>,
    ) -> Self {
        let mut values = BTreeMap::new();
        values.insert(field_id.into(), value);
        Self {
            data_type_id: data_type_id.into(),
            values,
            source_id,
            timestamp: Utc::now(),
        }
    }

    /// Value of a specific field.
    pub fn value(&self, field_id: &str) -> Option<f64> {
        self.values.get(field_id).copied()
    }

    /// The point's scalar value: the single field if present, otherwise the
    /// only value carried.
    pub fn single_value(&self) -> Option<f64> {
        if let Some(value) = self.value(field::SINGLE) {
            return Some(value);
        }
        if self.values.len() == 1 {
            return self.values.values().next().copied();
        }
        None
    }
}

/// State of a host data stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamState {
    /// The host is looking for a source
    Searching,
    /// A value is available
    Streaming(DataPoint),
    /// No source can provide this data type
    NotAvailable,
    /// The stream is idle
    Idle,
}

/// A device registered in the host's sensor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDevice {
    /// Full device identifier (`extension::uid`)
    pub id: String,
    /// Whether the user enabled the device
    pub enabled: bool,
    /// Data types the device provides
    pub supported_data_types: Vec<String>,
}

impl SavedDevice {
    /// Whether the device provides any of the given data types.
    pub fn supports_any(&self, data_types: &[&str]) -> bool {
        self.supported_data_types
            .iter()
            .any(|t| data_types.contains(&t.as_str()))
    }
}

/// The host's ordered sensor list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedDevices {
    /// Devices in priority order
    pub devices: Vec<SavedDevice>,
}
