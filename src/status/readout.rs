//! Live power and speed readout.

use crate::host::types::Units;

/// Latest power and speed seen on the host streams.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveReadout {
    /// Power in watts
    pub power_watts: Option<f64>,
    /// Speed in m/s
    pub speed_ms: Option<f64>,
}

impl LiveReadout {
    /// Two-line label in the rider's units.
    pub fn label(&self, units: Units) -> String {
        let power = self
            .power_watts
            .map(|p| format!("{:.0} W", p))
            .unwrap_or_else(|| "N/A".to_string());

        let speed = self
            .speed_ms
            .map(|s| {
                let (value, unit) = units.convert_speed(s);
                format!("{:.1} {}", value, unit)
            })
            .unwrap_or_else(|| "N/A".to_string());

        format!("Power: {}\nSpeed: {}", power, speed)
    }
}
