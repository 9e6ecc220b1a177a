//! Device connection session.
//!
//! A connection runs the indoor-ride gate for as long as the host keeps the
//! device connected. While the gate is indoor, a [`SimulationRun`] tracks the
//! latest power reading and ticks the simulator on a fixed interval. Both
//! flows live under one cancellation scope.

use crate::device::gate::{GateAction, GateSignal, IndoorGate};
use crate::device::types::{ConnectionStatus, DeviceEvent, ManufacturerInfo};
use crate::host::subscription::Subscription;
use crate::host::types::{data_type, ActiveRideProfile, StreamState, UserProfile};
use crate::host::HostService;
use crate::simulation::{PowerSample, SpeedSimulator};
use crate::storage::config::SimulationSettings;
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One indoor period: power tracking plus the tick loop.
pub(crate) struct SimulationRun {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl SimulationRun {
    /// Start a fresh simulation at rest.
    pub(crate) fn start(
        host: &dyn HostService,
        settings: &SimulationSettings,
        rider_weight_kg: f64,
        uid: &str,
        events: Sender<DeviceEvent>,
        parent: &CancellationToken,
    ) -> Self {
        let token = parent.child_token();

        let mut power = host.subscribe_stream(data_type::POWER);
        // Seed with whatever the host already knows so the first tick sees it
        let initial = power
            .latest()
            .map(|state| PowerSample::from_stream(&state))
            .unwrap_or_default();
        let (latest_tx, latest_rx) = watch::channel(initial);

        let simulator = SpeedSimulator::new(
            rider_weight_kg,
            settings.physics(),
            settings.update_interval(),
        );

        let mut tasks = JoinSet::new();
        tasks.spawn(track_power(power, latest_tx, token.clone()));
        tasks.spawn(tick_loop(
            simulator,
            latest_rx,
            events,
            uid.to_string(),
            token.clone(),
        ));

        Self { token, tasks }
    }

    /// Cancel both flows and wait for them to finish.
    pub(crate) async fn stop(&mut self) {
        self.token.cancel();
        while self.tasks.join_next().await.is_some() {}
    }
}

impl Drop for SimulationRun {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Keep the latest power sample up to date. Last value wins.
async fn track_power(
    mut power: Subscription<StreamState>,
    latest: watch::Sender<PowerSample>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            state = power.recv() => match state {
                Some(state) => {
                    latest.send_replace(PowerSample::from_stream(&state));
                }
                None => {
                    // Host closed the stream; fall back to zero power until torn down
                    latest.send_replace(PowerSample::absent());
                    token.cancelled().await;
                    break;
                }
            },
        }
    }
}

/// Tick the simulator and emit speed then distance for every interval.
async fn tick_loop(
    mut simulator: SpeedSimulator,
    latest: watch::Receiver<PowerSample>,
    events: Sender<DeviceEvent>,
    uid: String,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(simulator.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let power = *latest.borrow();
                let output = simulator.step(power, Instant::now().into_std());

                tracing::debug!(
                    "Emitting speed data point: {} m/s based on power: {} W",
                    output.speed_ms,
                    output.power_watts
                );

                let sent = events
                    .send(DeviceEvent::speed(output.speed_ms, &uid))
                    .and_then(|_| events.send(DeviceEvent::distance_delta(output.distance_delta_m, &uid)));
                if sent.is_err() {
                    tracing::debug!("Event receiver dropped, stopping tick loop for {}", uid);
                    break;
                }
            }
        }
    }
}

/// Upstream streams the gate listens to.
struct GateSubscriptions {
    user_profile: Subscription<UserProfile>,
    ride_profile: Subscription<ActiveRideProfile>,
    connection: Subscription<bool>,
}

impl GateSubscriptions {
    /// Next already-queued signal, host connection first.
    fn try_next(&mut self) -> Option<GateSignal> {
        if let Some(connected) = self.connection.try_recv() {
            return Some(GateSignal::HostConnection(connected));
        }
        if let Some(profile) = self.user_profile.try_recv() {
            return Some(GateSignal::UserProfile(profile));
        }
        self.ride_profile.try_recv().map(GateSignal::RideProfile)
    }
}

/// A live connection of the virtual device.
///
/// Dropping the connection cancels it.
pub struct DeviceConnection {
    uid: String,
    token: CancellationToken,
    events: Receiver<DeviceEvent>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceConnection {
    /// Open a connection and start the gate. Must be called within a tokio runtime.
    pub(crate) fn open(
        host: Arc<dyn HostService>,
        settings: SimulationSettings,
        uid: &str,
        token: CancellationToken,
    ) -> Self {
        let (tx, rx) = crossbeam::channel::unbounded();

        let subscriptions = GateSubscriptions {
            user_profile: host.subscribe_user_profile(),
            ride_profile: host.subscribe_ride_profile(),
            connection: host.subscribe_connection(),
        };

        let handle = tokio::spawn(run_gate(
            host,
            settings,
            uid.to_string(),
            subscriptions,
            tx,
            token.clone(),
        ));

        Self {
            uid: uid.to_string(),
            token,
            events: rx,
            handle: Some(handle),
        }
    }

    /// Device uid.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Receiver for events emitted to the host.
    pub fn events(&self) -> &Receiver<DeviceEvent> {
        &self.events
    }

    /// Cancel the connection.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the connection has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the connection and wait until the gate and any simulation have stopped.
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("Connection task for {} failed: {}", self.uid, e);
            }
        }
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for DeviceConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConnection")
            .field("uid", &self.uid)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

fn emit(events: &Sender<DeviceEvent>, event: DeviceEvent) {
    let _ = events.send(event);
}

/// Drive the gate until the connection is cancelled.
async fn run_gate(
    host: Arc<dyn HostService>,
    settings: SimulationSettings,
    uid: String,
    mut subscriptions: GateSubscriptions,
    events: Sender<DeviceEvent>,
    token: CancellationToken,
) {
    tracing::info!("Connect to {}", uid);

    let mut gate = IndoorGate::new();
    let mut run: Option<SimulationRun> = None;

    loop {
        let signal = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            // Closed upstreams disable their branch; the current state holds until torn down
            Some(connected) = subscriptions.connection.recv() => GateSignal::HostConnection(connected),
            Some(profile) = subscriptions.user_profile.recv() => GateSignal::UserProfile(profile),
            Some(profile) = subscriptions.ride_profile.recv() => GateSignal::RideProfile(profile),
        };

        tracing::debug!("Gate signal for {}: {:?}", uid, signal);
        let mut action = gate.apply(signal);

        // Act only on the state settled by every signal already queued
        while let Some(signal) = subscriptions.try_next() {
            tracing::debug!("Gate signal for {}: {:?}", uid, signal);
            match gate.apply(signal) {
                GateAction::Hold => {}
                next => action = next,
            }
        }

        match action {
            GateAction::Hold => {}
            GateAction::Start { rider_weight_kg } => {
                if let Some(mut previous) = run.take() {
                    previous.stop().await;
                }
                emit(&events, DeviceEvent::ConnectionStatus(ConnectionStatus::Connected));
                emit(&events, DeviceEvent::ManufacturerInfo(ManufacturerInfo::default()));
                run = Some(SimulationRun::start(
                    host.as_ref(),
                    &settings,
                    rider_weight_kg,
                    &uid,
                    events.clone(),
                    &token,
                ));
            }
            GateAction::Stop => {
                if let Some(mut previous) = run.take() {
                    previous.stop().await;
                }
                emit(&events, DeviceEvent::ConnectionStatus(ConnectionStatus::Disconnected));
            }
        }
    }

    if let Some(mut previous) = run.take() {
        previous.stop().await;
    }

    tracing::info!("Connection to {} closed", uid);
}
