//! Extension entry point: device discovery and connection management.

use crate::device::session::DeviceConnection;
use crate::device::types::{DeviceDescriptor, DeviceError, DEVICE_UID};
use crate::host::HostService;
use crate::storage::config::{DeviceSettings, SimulationSettings};
use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Handle of a running discovery broadcast.
///
/// Dropping the handle stops the broadcast.
pub struct ScanHandle {
    token: CancellationToken,
    devices: Receiver<DeviceDescriptor>,
}

impl ScanHandle {
    /// Receiver of advertised devices.
    pub fn devices(&self) -> &Receiver<DeviceDescriptor> {
        &self.devices
    }

    /// Stop the broadcast.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The virtual speed sensor extension.
pub struct WattSpeedExtension {
    /// Host service handle
    host: Arc<dyn HostService>,
    /// Simulation settings applied to new connections
    simulation: SimulationSettings,
    /// Device settings
    device: DeviceSettings,
    /// Active connections (uid -> cancellation token)
    connections: Mutex<HashMap<String, CancellationToken>>,
    /// Set once the extension is shut down
    shutdown: CancellationToken,
}

impl WattSpeedExtension {
    /// Create a new extension.
    pub fn new(
        host: Arc<dyn HostService>,
        simulation: SimulationSettings,
        device: DeviceSettings,
    ) -> Self {
        Self {
            host,
            simulation,
            device,
            connections: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a new extension with default settings.
    pub fn with_defaults(host: Arc<dyn HostService>) -> Self {
        Self::new(host, SimulationSettings::default(), DeviceSettings::default())
    }

    /// Descriptor of the device this extension provides.
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::virtual_speed_sensor()
    }

    /// Start advertising the virtual device.
    ///
    /// The descriptor is sent immediately and then once per scan interval
    /// until the handle is cancelled. Must be called within a tokio runtime.
    pub fn start_scan(&self) -> ScanHandle {
        let (tx, rx) = crossbeam::channel::unbounded();
        let token = self.shutdown.child_token();

        tokio::spawn(broadcast(
            self.descriptor(),
            self.device.scan_interval(),
            tx,
            token.clone(),
        ));

        ScanHandle { token, devices: rx }
    }

    /// Connect the virtual device.
    ///
    /// A second connect for the same uid replaces the previous connection.
    /// Must be called within a tokio runtime.
    pub async fn connect_device(&self, uid: &str) -> Result<DeviceConnection, DeviceError> {
        if self.shutdown.is_cancelled() {
            return Err(DeviceError::ShutDown);
        }
        if uid != DEVICE_UID {
            tracing::warn!("Refusing to connect unknown device: {}", uid);
            return Err(DeviceError::UnknownDevice(uid.to_string()));
        }

        let token = self.shutdown.child_token();
        let previous = self
            .connections
            .lock()
            .await
            .insert(uid.to_string(), token.clone());

        if let Some(previous) = previous {
            if !previous.is_cancelled() {
                tracing::info!("Replacing existing connection for {}", uid);
                previous.cancel();
            }
        }

        Ok(DeviceConnection::open(
            self.host.clone(),
            self.simulation.clone(),
            uid,
            token,
        ))
    }

    /// Cancel the connection for a uid.
    pub async fn disconnect(&self, uid: &str) -> Result<(), DeviceError> {
        let token = self
            .connections
            .lock()
            .await
            .remove(uid)
            .filter(|t| !t.is_cancelled())
            .ok_or_else(|| DeviceError::NotConnected(uid.to_string()))?;

        tracing::info!("Disconnecting device: {}", uid);
        token.cancel();
        Ok(())
    }

    /// Uids with a live connection.
    pub async fn connected_devices(&self) -> Vec<String> {
        self.connections
            .lock()
            .await
            .iter()
            .filter(|(_, token)| !token.is_cancelled())
            .map(|(uid, _)| uid.clone())
            .collect()
    }

    /// Shut down the extension, cancelling scans and connections.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down extension");
        self.shutdown.cancel();
        self.connections.lock().await.clear();
    }
}

/// Advertise a device until cancelled.
async fn broadcast(
    descriptor: DeviceDescriptor,
    period: Duration,
    devices: Sender<DeviceDescriptor>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if devices.send(descriptor.clone()).is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Discovery broadcast for {} stopped", descriptor.uid);
}
