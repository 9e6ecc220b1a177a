//! Virtual device identity, events and errors.

use crate::host::types::{data_type, field, DataPoint};
use thiserror::Error;

/// Extension identifier registered with the host
pub const EXTENSION_ID: &str = "wattspeed";
/// Uid of the virtual speed sensor
pub const DEVICE_UID: &str = "wattspeed-virtual-device-2";
/// Uid as it appears in the host's sensor list (`extension::uid`)
pub const DEVICE_FULL_UID: &str = "wattspeed::wattspeed-virtual-device-2";
/// Custom channel carrying the distance traveled since the previous tick
pub const DISTANCE_DIFF_DATA_TYPE: &str = "TYPE_SPD_DISTANCE_DIFF_ID";
/// Name shown by the host during discovery
pub const DISPLAY_NAME: &str = "WattSpeed";

/// Connection status reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "CONNECTED"),
            ConnectionStatus::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

/// Static identity metadata sent on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerInfo {
    pub manufacturer: String,
}

impl Default for ManufacturerInfo {
    fn default() -> Self {
        Self {
            manufacturer: EXTENSION_ID.to_string(),
        }
    }
}

/// Device advertised while the host scans for sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Owning extension
    pub extension_id: String,
    /// Device uid
    pub uid: String,
    /// Data types the device provides
    pub data_types: Vec<String>,
    /// User-facing name
    pub display_name: String,
}

impl DeviceDescriptor {
    /// Descriptor of the virtual speed sensor.
    pub fn virtual_speed_sensor() -> Self {
        Self {
            extension_id: EXTENSION_ID.to_string(),
            uid: DEVICE_UID.to_string(),
            data_types: vec![
                data_type::SPEED_SOURCE.to_string(),
                DISTANCE_DIFF_DATA_TYPE.to_string(),
            ],
            display_name: DISPLAY_NAME.to_string(),
        }
    }

    /// `extension::uid` form used in the host's sensor list.
    pub fn full_uid(&self) -> String {
        format!("{}::{}", self.extension_id, self.uid)
    }
}

/// Events emitted by a device connection.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// Manufacturer metadata
    ManufacturerInfo(ManufacturerInfo),
    /// A simulated data point
    DataPoint(DataPoint),
}

impl DeviceEvent {
    /// Speed data point tagged to the speed source channel.
    pub fn speed(speed_ms: f64, uid: &str) -> Self {
        DeviceEvent::DataPoint(DataPoint::single(
            data_type::SPEED_SOURCE,
            field::SPEED,
            speed_ms,
            Some(uid.to_string()),
        ))
    }

    /// Distance-delta data point tagged to the custom channel.
    pub fn distance_delta(distance_m: f64, uid: &str) -> Self {
        DeviceEvent::DataPoint(DataPoint::single(
            DISTANCE_DIFF_DATA_TYPE,
            field::DISTANCE,
            distance_m,
            Some(uid.to_string()),
        ))
    }
}

/// Errors that can occur on the extension surface.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The host asked for a device this extension does not provide
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// No active connection for the given uid
    #[error("Device not connected: {0}")]
    NotConnected(String),

    /// The extension has been shut down
    #[error("Extension is shut down")]
    ShutDown,
}
