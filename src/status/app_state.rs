//! Classification of the extension's setup state as shown to the rider.

use crate::device::types::DEVICE_FULL_UID;
use crate::host::types::{data_type, SavedDevices};

/// Data types that mark a saved device as a speed source
pub const SPEED_DATA_TYPES: [&str; 5] = [
    data_type::POWER_SPEED,
    data_type::CSC_SPEED,
    data_type::LOCATION_SPEED,
    data_type::SPEED,
    data_type::SPEED_SOURCE,
];

/// Setup state of the virtual sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// The host service did not connect within the grace period
    HostNotConnected,
    /// Waiting for the saved device list
    #[default]
    Loading,
    /// The virtual sensor is not in the host's sensor list
    NotPaired,
    /// Another speed sensor takes priority over the virtual one
    NotPrimarySource,
    /// Paired but disabled, or the ride profile is not indoor
    Disabled,
    /// Paired, enabled and primary on an indoor profile
    Connected,
}

impl AppState {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            AppState::HostNotConnected => "Not connected to the host system",
            AppState::Loading => "Loading...",
            AppState::NotPaired => "Virtual sensor not added",
            AppState::NotPrimarySource => "Another speed sensor has priority",
            AppState::Disabled => "Disabled or ride profile is not indoor",
            AppState::Connected => "Providing speed",
        }
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Latest known inputs of the classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusInputs {
    /// Host connection flag
    pub host_connected: bool,
    /// Whether the host has had its grace period to connect
    pub connection_grace_elapsed: bool,
    /// Saved device list, if received
    pub saved_devices: Option<SavedDevices>,
    /// Indoor flag of the active ride profile, if received
    pub indoor: Option<bool>,
}

/// Classify the setup state.
pub fn classify(inputs: &StatusInputs) -> AppState {
    if !inputs.host_connected && inputs.connection_grace_elapsed {
        return AppState::HostNotConnected;
    }

    let Some(saved) = &inputs.saved_devices else {
        return AppState::Loading;
    };

    let Some(own_index) = saved.devices.iter().position(|d| d.id == DEVICE_FULL_UID) else {
        return AppState::NotPaired;
    };

    let first_speed_index = saved
        .devices
        .iter()
        .position(|d| d.supports_any(&SPEED_DATA_TYPES));
    if first_speed_index.is_some_and(|index| index < own_index) {
        return AppState::NotPrimarySource;
    }

    let enabled = saved.devices[own_index].enabled && inputs.indoor == Some(true);
    if enabled {
        AppState::Connected
    } else {
        AppState::Disabled
    }
}
