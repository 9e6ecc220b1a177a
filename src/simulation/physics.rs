//! Physics engine for power-to-speed simulation
//!
//! Implements a simplified cycling physics model that integrates speed over
//! fixed time steps from rider power, rolling resistance and aerodynamic drag.
//! Acceleration is bounded per step and an extra deceleration kicks in once
//! the rider has stopped supplying power for a while.

use std::time::{Duration, Instant};

/// Physics constants
pub const AIR_DENSITY: f64 = 1.225; // kg/m³ at sea level
pub const GRAVITY: f64 = 9.81; // m/s²
pub const DEFAULT_CRR: f64 = 0.005; // Rolling resistance on tarmac
pub const DEFAULT_CDA: f64 = 0.32; // m² (aero road position)
pub const BIKE_MASS: f64 = 9.0; // kg

/// Maximum acceleration in m/s² (realistic for a bicycle)
pub const MAX_ACCELERATION: f64 = 5.0;
/// Time without positive power after which the rider is considered coasting
pub const COASTING_THRESHOLD: Duration = Duration::from_secs(3);
/// Extra deceleration applied while coasting, m/s²
pub const COASTING_DECELERATION: f64 = 2.0;

/// Speed floor used when deriving the driving force, m/s
const MIN_EFFECTIVE_SPEED: f64 = 0.01;

/// Parameters of the power-to-speed model
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsParams {
    /// Air density in kg/m³
    pub air_density: f64,
    /// Gravitational acceleration in m/s²
    pub gravity: f64,
    /// Rolling resistance coefficient
    pub crr: f64,
    /// Drag coefficient times frontal area (CdA)
    pub cda: f64,
    /// Bike mass added to the rider weight, kg
    pub bike_mass_kg: f64,
    /// Acceleration bound in m/s²
    pub max_acceleration: f64,
    /// Time since the last positive power sample before coasting applies
    pub coasting_threshold: Duration,
    /// Coasting deceleration in m/s²
    pub coasting_deceleration: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            air_density: AIR_DENSITY,
            gravity: GRAVITY,
            crr: DEFAULT_CRR,
            cda: DEFAULT_CDA,
            bike_mass_kg: BIKE_MASS,
            max_acceleration: MAX_ACCELERATION,
            coasting_threshold: COASTING_THRESHOLD,
            coasting_deceleration: COASTING_DECELERATION,
        }
    }
}

impl PhysicsParams {
    /// Total system mass (rider + bike)
    pub fn total_mass(&self, rider_weight_kg: f64) -> f64 {
        rider_weight_kg + self.bike_mass_kg
    }

    /// Aerodynamic drag plus rolling resistance at the given speed, in newtons
    pub fn resistance_force(&self, speed: f64, mass: f64) -> f64 {
        let drag = 0.5 * self.air_density * self.cda * speed * speed;
        let rolling = self.crr * mass * self.gravity;
        drag + rolling
    }

    /// Whether the rider counts as coasting at `now`.
    ///
    /// Coasting requires a previous positive power sample; a rider who never
    /// pedalled is simply at rest.
    pub fn is_coasting(&self, last_power_supplied_at: Option<Instant>, now: Instant) -> bool {
        match last_power_supplied_at {
            Some(at) => now.saturating_duration_since(at) > self.coasting_threshold,
            None => false,
        }
    }

    /// Integrate one step of the model.
    ///
    /// # Arguments
    /// * `current_speed` - Speed at the start of the step in m/s
    /// * `power` - Rider power in watts, 0 when nothing is observed
    /// * `rider_weight_kg` - Rider weight in kilograms
    /// * `coasting` - Whether the coasting decay applies to this step
    /// * `interval_secs` - Simulated time covered by the step
    ///
    /// # Returns
    /// Speed in meters per second, never negative
    pub fn next_speed(
        &self,
        current_speed: f64,
        power: f64,
        rider_weight_kg: f64,
        coasting: bool,
        interval_secs: f64,
    ) -> f64 {
        let mass = self.total_mass(rider_weight_kg);

        // Power = Force × Velocity; the floor keeps a standing start finite
        let effective_speed = current_speed.max(MIN_EFFECTIVE_SPEED);
        let driving_force = power / effective_speed;

        let net_force = driving_force - self.resistance_force(current_speed, mass);
        let acceleration = net_force / mass;

        // The bound is compared against the raw acceleration, then applied as
        // the per-step speed change
        let max_step = self.max_acceleration * interval_secs;
        let limited_speed = if acceleration > max_step {
            current_speed + max_step
        } else if acceleration < -max_step {
            current_speed - max_step
        } else {
            current_speed + acceleration * interval_secs
        };

        let speed = if coasting {
            limited_speed - self.coasting_deceleration * interval_secs
        } else {
            limited_speed
        };

        // f64::max drops NaN in favour of the floor
        speed.max(0.0)
    }

    /// Run one simulation tick.
    ///
    /// Updates the last-power timestamp when `power` is positive, then
    /// integrates the model. Returns the new speed and the updated timestamp.
    pub fn tick(
        &self,
        current_speed: f64,
        power: f64,
        rider_weight_kg: f64,
        last_power_supplied_at: Option<Instant>,
        now: Instant,
        interval_secs: f64,
    ) -> (f64, Option<Instant>) {
        let last_power_supplied_at = if power > 0.0 {
            Some(now)
        } else {
            last_power_supplied_at
        };

        let coasting = self.is_coasting(last_power_supplied_at, now);
        let speed = self.next_speed(
            current_speed,
            power,
            rider_weight_kg,
            coasting,
            interval_secs,
        );

        (speed, last_power_supplied_at)
    }
}

/// Run one tick with the default model parameters.
pub fn tick(
    current_speed: f64,
    power: f64,
    rider_weight_kg: f64,
    last_power_supplied_at: Option<Instant>,
    now: Instant,
    interval_secs: f64,
) -> (f64, Option<Instant>) {
    PhysicsParams::default().tick(
        current_speed,
        power,
        rider_weight_kg,
        last_power_supplied_at,
        now,
        interval_secs,
    )
}
