//! Indoor-ride gate.
//!
//! Decides whether the speed simulation should run. The decision is a pure
//! function of the latest host connection flag, user profile and the active
//! ride profile's indoor flag, recomputed whenever one of them changes.

use crate::host::types::{ActiveRideProfile, UserProfile};

/// Phase of the gate state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatePhase {
    /// User profile or ride profile not yet known
    #[default]
    AwaitingProfiles,
    /// Ride profile is marked indoor
    Indoor,
    /// Ride profile is not marked indoor
    NotIndoor,
}

/// Whether the simulation should be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndoorGateState {
    Disconnected,
    Running,
}

/// Latest known value of each upstream signal.
#[derive(Debug, Clone, PartialEq)]
pub struct GateInputs {
    /// Host connection flag, assumed up until the host says otherwise
    pub host_connected: bool,
    /// Latest user profile
    pub user_profile: Option<UserProfile>,
    /// Latest indoor flag of the active ride profile
    pub indoor: Option<bool>,
}

impl Default for GateInputs {
    fn default() -> Self {
        Self {
            host_connected: true,
            user_profile: None,
            indoor: None,
        }
    }
}

impl GateInputs {
    /// Phase implied by the profile inputs.
    pub fn phase(&self) -> GatePhase {
        match (&self.user_profile, self.indoor) {
            (Some(_), Some(true)) => GatePhase::Indoor,
            (Some(_), Some(false)) => GatePhase::NotIndoor,
            _ => GatePhase::AwaitingProfiles,
        }
    }

    /// Derived gate state.
    pub fn evaluate(&self) -> IndoorGateState {
        let weight_ok = self
            .user_profile
            .as_ref()
            .is_some_and(UserProfile::has_valid_weight);

        if self.host_connected && weight_ok && self.phase() == GatePhase::Indoor {
            IndoorGateState::Running
        } else {
            IndoorGateState::Disconnected
        }
    }
}

/// An upstream change fed to the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateSignal {
    UserProfile(UserProfile),
    RideProfile(ActiveRideProfile),
    HostConnection(bool),
}

/// What the caller must do after a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateAction {
    /// Nothing changed
    Hold,
    /// Start a fresh simulation, replacing any running one
    Start { rider_weight_kg: f64 },
    /// Tear down any running simulation and report disconnected
    Stop,
}

/// Recompute-on-change state machine around [`GateInputs`].
#[derive(Debug, Clone, Default)]
pub struct IndoorGate {
    inputs: GateInputs,
}

impl IndoorGate {
    /// Create a gate awaiting profiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current inputs.
    pub fn inputs(&self) -> &GateInputs {
        &self.inputs
    }

    /// Current phase.
    pub fn phase(&self) -> GatePhase {
        self.inputs.phase()
    }

    /// Apply an upstream signal.
    ///
    /// Signals that leave the inputs unchanged are ignored. The ride profile
    /// only contributes its indoor flag, so renaming a profile is not a change.
    pub fn apply(&mut self, signal: GateSignal) -> GateAction {
        let mut next = self.inputs.clone();
        match signal {
            GateSignal::UserProfile(profile) => next.user_profile = Some(profile),
            GateSignal::RideProfile(profile) => next.indoor = Some(profile.indoor),
            GateSignal::HostConnection(connected) => next.host_connected = connected,
        }

        if next == self.inputs {
            return GateAction::Hold;
        }
        self.inputs = next;

        let phase = self.inputs.phase();
        match (self.inputs.evaluate(), &self.inputs.user_profile) {
            (IndoorGateState::Running, Some(profile)) => {
                tracing::info!(
                    "Indoor ride active, starting simulation for {} kg rider",
                    profile.weight_kg
                );
                GateAction::Start {
                    rider_weight_kg: profile.weight_kg,
                }
            }
            _ if phase == GatePhase::AwaitingProfiles => GateAction::Hold,
            _ => {
                if phase == GatePhase::Indoor && self.inputs.host_connected {
                    tracing::warn!(
                        "Ignoring indoor ride: invalid rider weight {:?}",
                        self.inputs.user_profile.as_ref().map(|p| p.weight_kg)
                    );
                } else {
                    tracing::info!(
                        "Simulation idle (phase: {:?}, host connected: {})",
                        phase,
                        self.inputs.host_connected
                    );
                }
                GateAction::Stop
            }
        }
    }
}
