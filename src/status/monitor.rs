//! Status monitor: recomputes the status snapshot whenever an input changes.

use crate::host::types::{data_type, StreamState, Units};
use crate::host::HostService;
use crate::status::app_state::{classify, AppState, StatusInputs};
use crate::status::readout::LiveReadout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Everything a status screen needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Setup state
    pub state: AppState,
    /// Live values
    pub readout: LiveReadout,
    /// Rider's unit preference
    pub units: Units,
    /// Name of the active ride profile, if received
    pub profile_name: Option<String>,
}

impl StatusSnapshot {
    /// Readout label in the rider's units.
    pub fn label(&self) -> String {
        self.readout.label(self.units)
    }

    /// Extra line for the disabled state naming the active ride profile.
    pub fn detail(&self) -> Option<String> {
        match (self.state, &self.profile_name) {
            (AppState::Disabled, Some(name)) => Some(format!("Current profile: {}", name)),
            _ => None,
        }
    }
}

/// Latest upstream values held by the monitor task.
#[derive(Debug, Default)]
struct MonitorInputs {
    status: StatusInputs,
    readout: LiveReadout,
    units: Units,
    profile_name: Option<String>,
}

impl MonitorInputs {
    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: classify(&self.status),
            readout: self.readout,
            units: self.units,
            profile_name: self.profile_name.clone(),
        }
    }
}

fn stream_value(state: &StreamState) -> Option<f64> {
    match state {
        StreamState::Streaming(point) => point.single_value(),
        _ => None,
    }
}

/// Background task that keeps a [`StatusSnapshot`] current.
///
/// Dropping the monitor stops the task.
pub struct StatusMonitor {
    snapshot: watch::Receiver<StatusSnapshot>,
    token: CancellationToken,
}

impl StatusMonitor {
    /// Start monitoring. Must be called within a tokio runtime.
    pub fn spawn(host: Arc<dyn HostService>, connection_grace: Duration) -> Self {
        let (tx, rx) = watch::channel(StatusSnapshot::default());
        let token = CancellationToken::new();

        tokio::spawn(monitor(host, connection_grace, tx, token.clone()));

        Self {
            snapshot: rx,
            token,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot.clone()
    }

    /// Stop monitoring.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn monitor(
    host: Arc<dyn HostService>,
    connection_grace: Duration,
    snapshot: watch::Sender<StatusSnapshot>,
    token: CancellationToken,
) {
    let mut connection = host.subscribe_connection();
    let mut saved_devices = host.subscribe_saved_devices();
    let mut ride_profile = host.subscribe_ride_profile();
    let mut user_profile = host.subscribe_user_profile();
    let mut power = host.subscribe_stream(data_type::POWER);
    let mut speed = host.subscribe_stream(data_type::SPEED);

    let grace = tokio::time::sleep(connection_grace);
    tokio::pin!(grace);

    let mut inputs = MonitorInputs::default();

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = &mut grace, if !inputs.status.connection_grace_elapsed => {
                inputs.status.connection_grace_elapsed = true;
            }
            Some(connected) = connection.recv() => inputs.status.host_connected = connected,
            Some(devices) = saved_devices.recv() => inputs.status.saved_devices = Some(devices),
            Some(profile) = ride_profile.recv() => {
                inputs.status.indoor = Some(profile.indoor);
                inputs.profile_name = Some(profile.name);
            },
            Some(profile) = user_profile.recv() => inputs.units = profile.preferred_unit,
            Some(state) = power.recv() => inputs.readout.power_watts = stream_value(&state),
            Some(state) = speed.recv() => inputs.readout.speed_ms = stream_value(&state),
        }

        let next = inputs.snapshot();
        snapshot.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if current.state != next.state {
                tracing::info!("App state: {:?} -> {:?}", current.state, next.state);
            }
            *current = next;
            true
        });
    }
}
