//! Derived status of the virtual sensor for a companion screen.

pub mod app_state;
pub mod monitor;
pub mod readout;

pub use app_state::{classify, AppState, StatusInputs, SPEED_DATA_TYPES};
pub use monitor::{StatusMonitor, StatusSnapshot};
pub use readout::LiveReadout;
