//! WattSpeed - Virtual Speed Sensor for Indoor Rides
//!
//! Headless runner: replays the configured power script through an
//! in-process host and logs everything the virtual sensor emits.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wattspeed::device::{
    DeviceDescriptor, DeviceEvent, WattSpeedExtension, DEVICE_FULL_UID, DEVICE_UID,
};
use wattspeed::host::{
    data_type, ActiveRideProfile, HostService, LocalHost, SavedDevice, SavedDevices, StreamState,
    UserProfile,
};
use wattspeed::status::StatusMonitor;
use wattspeed::storage::config::{load_config, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WattSpeed v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("failed to load configuration")?;
    run(config).await
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let host = LocalHost::new();
    let descriptor = DeviceDescriptor::virtual_speed_sensor();

    host.set_connected(true);
    host.publish_saved_devices(SavedDevices {
        devices: vec![SavedDevice {
            id: DEVICE_FULL_UID.to_string(),
            enabled: true,
            supported_data_types: descriptor.data_types.clone(),
        }],
    });
    host.publish_user_profile(UserProfile::with_weight(config.demo.rider_weight_kg));
    host.publish_ride_profile(ActiveRideProfile::new(
        config.demo.profile_name.clone(),
        config.demo.indoor,
    ));

    let service: Arc<dyn HostService> = Arc::new(host.clone());
    let extension =
        WattSpeedExtension::new(service.clone(), config.simulation.clone(), config.device.clone());
    let monitor = StatusMonitor::spawn(service, config.device.host_connection_grace());

    let connection = extension.connect_device(DEVICE_UID).await?;
    let interval = config.simulation.update_interval();
    let mut total_distance = 0.0;

    for segment in &config.demo.segments {
        tracing::info!("Segment: {} W for {} s", segment.watts, segment.duration_secs);
        host.publish_power(segment.watts);

        let ticks = (segment.duration_secs.max(0.0) / interval.as_secs_f64()).ceil() as u64;
        for _ in 0..ticks {
            tokio::time::sleep(interval).await;

            for event in connection.events().try_iter() {
                match event {
                    DeviceEvent::DataPoint(point)
                        if point.data_type_id == data_type::SPEED_SOURCE =>
                    {
                        // The host shows our speed on its speed stream
                        host.publish_stream(data_type::SPEED, StreamState::Streaming(point));
                    }
                    DeviceEvent::DataPoint(point) => {
                        total_distance += point.single_value().unwrap_or(0.0);
                    }
                    other => tracing::info!("Device event: {:?}", other),
                }
            }
        }

        let snapshot = monitor.snapshot();
        tracing::info!("{} | {}", snapshot.state, snapshot.label().replace('\n', ", "));
        if let Some(detail) = snapshot.detail() {
            tracing::info!("{}", detail);
        }
    }

    tracing::info!("Simulated distance: {:.1} m", total_distance);

    connection.close().await;
    extension.shutdown().await;
    monitor.stop();

    Ok(())
}
