//! Virtual speed sensor device.

pub mod extension;
pub mod gate;
pub mod session;
pub mod types;

pub use extension::{ScanHandle, WattSpeedExtension};
pub use gate::{GateAction, GateInputs, GatePhase, GateSignal, IndoorGate, IndoorGateState};
pub use session::DeviceConnection;
pub use types::{
    ConnectionStatus, DeviceDescriptor, DeviceError, DeviceEvent, ManufacturerInfo,
    DEVICE_FULL_UID, DEVICE_UID, DISPLAY_NAME, DISTANCE_DIFF_DATA_TYPE, EXTENSION_ID,
};
