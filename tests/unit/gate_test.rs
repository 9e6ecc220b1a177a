//! Unit tests for the indoor-ride gate state machine.

use wattspeed::device::{GateAction, GateInputs, GatePhase, GateSignal, IndoorGate, IndoorGateState};
use wattspeed::host::{ActiveRideProfile, Units, UserProfile};

fn indoor_gate(weight: f64) -> IndoorGate {
    let mut gate = IndoorGate::new();
    gate.apply(GateSignal::UserProfile(UserProfile::with_weight(weight)));
    gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Trainer", true)));
    gate
}

/// Derived state for each combination of inputs.
#[test]
fn test_evaluate_truth_table() {
    let profile = Some(UserProfile::with_weight(75.0));

    let cases = [
        (true, profile.clone(), Some(true), IndoorGateState::Running),
        (false, profile.clone(), Some(true), IndoorGateState::Disconnected),
        (true, profile.clone(), Some(false), IndoorGateState::Disconnected),
        (true, profile.clone(), None, IndoorGateState::Disconnected),
        (true, None, Some(true), IndoorGateState::Disconnected),
    ];

    for (host_connected, user_profile, indoor, expected) in cases {
        let inputs = GateInputs {
            host_connected,
            user_profile,
            indoor,
        };
        assert_eq!(inputs.evaluate(), expected, "inputs: {:?}", inputs);
    }
}

/// The host counts as connected until told otherwise.
#[test]
fn test_default_inputs() {
    let inputs = GateInputs::default();
    assert!(inputs.host_connected);
    assert_eq!(inputs.phase(), GatePhase::AwaitingProfiles);
}

/// Ride profile alone does not start the simulation.
#[test]
fn test_ride_profile_without_user_profile_holds() {
    let mut gate = IndoorGate::new();
    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Trainer", true)));
    assert_eq!(action, GateAction::Hold);
}

/// Indoor -> outdoor -> indoor restarts the simulation.
#[test]
fn test_toggle_restarts() {
    let mut gate = indoor_gate(75.0);

    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Road", false)));
    assert_eq!(action, GateAction::Stop);
    assert_eq!(gate.phase(), GatePhase::NotIndoor);

    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Trainer", true)));
    assert_eq!(action, GateAction::Start { rider_weight_kg: 75.0 });
}

/// Renaming the ride profile is not a change.
#[test]
fn test_ride_profile_rename_holds() {
    let mut gate = indoor_gate(75.0);
    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Zwift", true)));
    assert_eq!(action, GateAction::Hold);
}

/// A repeated user profile is not a change.
#[test]
fn test_same_user_profile_holds() {
    let mut gate = indoor_gate(75.0);
    let action = gate.apply(GateSignal::UserProfile(UserProfile::with_weight(75.0)));
    assert_eq!(action, GateAction::Hold);
}

/// A new user profile restarts with the new weight.
#[test]
fn test_new_weight_restarts() {
    let mut gate = indoor_gate(75.0);
    let action = gate.apply(GateSignal::UserProfile(UserProfile::with_weight(68.0)));
    assert_eq!(action, GateAction::Start { rider_weight_kg: 68.0 });
}

/// Any profile change restarts, not just the weight.
#[test]
fn test_unit_change_restarts() {
    let mut gate = indoor_gate(75.0);
    let profile = UserProfile {
        weight_kg: 75.0,
        preferred_unit: Units::Imperial,
    };
    let action = gate.apply(GateSignal::UserProfile(profile));
    assert_eq!(action, GateAction::Start { rider_weight_kg: 75.0 });
}

/// Host disconnect stops, reconnect starts again.
#[test]
fn test_host_connection_toggles() {
    let mut gate = indoor_gate(75.0);

    assert_eq!(gate.apply(GateSignal::HostConnection(false)), GateAction::Stop);
    assert_eq!(gate.apply(GateSignal::HostConnection(false)), GateAction::Hold);
    assert_eq!(
        gate.apply(GateSignal::HostConnection(true)),
        GateAction::Start { rider_weight_kg: 75.0 }
    );
}

/// Zero weight on an indoor profile keeps the gate disconnected.
#[test]
fn test_zero_weight_stops() {
    let mut gate = IndoorGate::new();
    gate.apply(GateSignal::UserProfile(UserProfile::with_weight(0.0)));
    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Trainer", true)));
    assert_eq!(action, GateAction::Stop);
}

/// Outdoor profile from the start reports disconnected.
#[test]
fn test_outdoor_from_start_stops() {
    let mut gate = IndoorGate::new();
    gate.apply(GateSignal::UserProfile(UserProfile::with_weight(75.0)));
    let action = gate.apply(GateSignal::RideProfile(ActiveRideProfile::new("Road", false)));
    assert_eq!(action, GateAction::Stop);
    assert_eq!(gate.inputs().indoor, Some(false));
}
