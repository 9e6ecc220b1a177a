//! Simulation state and tick output types.

use crate::host::types::StreamState;
use std::time::Instant;

/// Mutable state of one running simulation.
///
/// Created at rest whenever an indoor period starts and dropped when it ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Current speed in m/s, never negative
    pub current_speed: f64,
    /// When power was last observed above zero
    pub last_power_positive_at: Option<Instant>,
    /// Rider weight in kilograms, fixed for the lifetime of the simulation
    pub rider_weight_kg: f64,
}

impl SimulationState {
    /// State of a rider at rest.
    pub fn at_rest(rider_weight_kg: f64) -> Self {
        Self {
            current_speed: 0.0,
            last_power_positive_at: None,
            rider_weight_kg,
        }
    }
}

/// Most recently observed power value.
///
/// Only the latest value matters; an absent sample means no power is
/// currently observed and counts as 0 W.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerSample(Option<f64>);

impl PowerSample {
    /// A sample carrying the given wattage.
    pub fn new(watts: f64) -> Self {
        Self(Some(watts))
    }

    /// No power observed.
    pub fn absent() -> Self {
        Self(None)
    }

    /// Latest power from a host stream state; anything but a streaming
    /// state clears the sample.
    pub fn from_stream(state: &StreamState) -> Self {
        match state {
            StreamState::Streaming(point) => Self(point.single_value()),
            _ => Self::absent(),
        }
    }

    /// Power in watts, 0 when absent.
    pub fn watts(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

/// Values produced by a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// New speed in m/s
    pub speed_ms: f64,
    /// Distance covered during the elapsed interval, meters
    pub distance_delta_m: f64,
    /// Power the tick was computed from, watts
    pub power_watts: f64,
}
