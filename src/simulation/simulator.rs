//! Stateful speed simulator driven by fixed-interval ticks.

use crate::simulation::physics::PhysicsParams;
use crate::simulation::types::{PowerSample, SimulationState, TickOutput};
use std::time::{Duration, Instant};

/// Default update interval between ticks
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Converts a power stream into speed and per-tick distance.
#[derive(Debug, Clone)]
pub struct SpeedSimulator {
    /// Model parameters
    params: PhysicsParams,
    /// Simulated time covered by each tick
    interval: Duration,
    /// Current state
    state: SimulationState,
}

impl SpeedSimulator {
    /// Create a simulator at rest.
    pub fn new(rider_weight_kg: f64, params: PhysicsParams, interval: Duration) -> Self {
        Self {
            params,
            interval,
            state: SimulationState::at_rest(rider_weight_kg),
        }
    }

    /// Create a simulator with default parameters and the 500 ms interval.
    pub fn with_defaults(rider_weight_kg: f64) -> Self {
        Self::new(rider_weight_kg, PhysicsParams::default(), UPDATE_INTERVAL)
    }

    /// Current simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance the simulation by one interval.
    ///
    /// The distance delta uses the new speed, not the average of old and new.
    pub fn step(&mut self, power: PowerSample, now: Instant) -> TickOutput {
        let interval_secs = self.interval.as_secs_f64();
        let power_watts = power.watts();

        let (speed, last_power) = self.params.tick(
            self.state.current_speed,
            power_watts,
            self.state.rider_weight_kg,
            self.state.last_power_positive_at,
            now,
            interval_secs,
        );

        self.state.current_speed = speed;
        self.state.last_power_positive_at = last_power;

        TickOutput {
            speed_ms: speed,
            distance_delta_m: speed * interval_secs,
            power_watts,
        }
    }
}
