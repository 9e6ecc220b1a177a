//! Integration tests for the device connection: gate, power tracking and tick loop.

use std::sync::Arc;
use std::time::Duration;
use wattspeed::device::{
    ConnectionStatus, DeviceConnection, DeviceEvent, ManufacturerInfo, WattSpeedExtension,
    DEVICE_UID, DISTANCE_DIFF_DATA_TYPE,
};
use wattspeed::host::{
    data_type, field, ActiveRideProfile, HostService, LocalHost, StreamState, TopicKey,
    UserProfile,
};

fn host_with_profiles(weight: f64, indoor: bool) -> LocalHost {
    let host = LocalHost::new();
    host.publish_user_profile(UserProfile::with_weight(weight));
    host.publish_ride_profile(ActiveRideProfile::new("Trainer", indoor));
    host
}

async fn connect(host: &LocalHost) -> (WattSpeedExtension, DeviceConnection) {
    let service: Arc<dyn HostService> = Arc::new(host.clone());
    let extension = WattSpeedExtension::with_defaults(service);
    let connection = extension.connect_device(DEVICE_UID).await.unwrap();
    (extension, connection)
}

fn drain(connection: &DeviceConnection) -> Vec<DeviceEvent> {
    connection.events().try_iter().collect()
}

fn speeds(events: &[DeviceEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::DataPoint(point) if point.data_type_id == data_type::SPEED_SOURCE => {
                point.value(field::SPEED)
            }
            _ => None,
        })
        .collect()
}

fn distances(events: &[DeviceEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            DeviceEvent::DataPoint(point) if point.data_type_id == DISTANCE_DIFF_DATA_TYPE => {
                point.value(field::DISTANCE)
            }
            _ => None,
        })
        .collect()
}

fn power_key() -> TopicKey {
    TopicKey::Stream(data_type::POWER.to_string())
}

/// Indoor profile connects, sends identity, then speed and distance per tick.
#[tokio::test(start_paused = true)]
async fn test_indoor_emits_speed_then_distance() {
    let host = host_with_profiles(75.0, true);
    host.publish_power(200.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(1250)).await;
    let events = drain(&connection);

    assert_eq!(
        events[0],
        DeviceEvent::ConnectionStatus(ConnectionStatus::Connected)
    );
    assert_eq!(
        events[1],
        DeviceEvent::ManufacturerInfo(ManufacturerInfo::default())
    );

    // Data points alternate speed, distance
    for pair in events[2..].chunks(2) {
        match pair {
            [DeviceEvent::DataPoint(speed), DeviceEvent::DataPoint(distance)] => {
                assert_eq!(speed.data_type_id, data_type::SPEED_SOURCE);
                assert_eq!(distance.data_type_id, DISTANCE_DIFF_DATA_TYPE);
                assert_eq!(speed.source_id.as_deref(), Some(DEVICE_UID));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    let speeds = speeds(&events);
    let distances = distances(&events);
    assert!(speeds.len() >= 2, "got {} ticks", speeds.len());
    assert!((speeds[0] - 2.5).abs() < 1e-9);
    assert!(speeds[1] > speeds[0]);
    for (speed, distance) in speeds.iter().zip(&distances) {
        assert!((distance - speed * 0.5).abs() < 1e-9);
    }
}

/// Outdoor profile reports disconnected and produces no data.
#[tokio::test(start_paused = true)]
async fn test_outdoor_reports_disconnected() {
    let host = host_with_profiles(75.0, false);
    host.publish_power(200.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        drain(&connection),
        vec![DeviceEvent::ConnectionStatus(ConnectionStatus::Disconnected)]
    );
    assert_eq!(host.consumer_count(&power_key()), 0);
}

/// Without any profile nothing is emitted.
#[tokio::test(start_paused = true)]
async fn test_awaiting_profiles_is_silent() {
    let host = LocalHost::new();
    host.publish_user_profile(UserProfile::with_weight(75.0));
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&connection).is_empty());
}

/// A power stream that never delivers counts as zero power.
#[tokio::test(start_paused = true)]
async fn test_missing_power_is_zero() {
    let host = host_with_profiles(75.0, true);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    let speeds = speeds(&drain(&connection));

    assert!(!speeds.is_empty());
    assert!(speeds.iter().all(|s| *s == 0.0));
}

/// Indoor -> outdoor -> indoor restarts the simulation from rest.
#[tokio::test(start_paused = true)]
async fn test_toggle_resets_simulation() {
    let host = host_with_profiles(75.0, true);
    host.publish_power(300.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(3250)).await;
    let before = speeds(&drain(&connection));
    let last_before = *before.last().unwrap();
    assert!(last_before > 2.5);

    host.publish_ride_profile(ActiveRideProfile::new("Road", false));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = drain(&connection);
    let disconnected = events
        .iter()
        .position(|e| *e == DeviceEvent::ConnectionStatus(ConnectionStatus::Disconnected))
        .expect("no disconnect event");
    assert!(speeds(&events[disconnected..]).is_empty());

    // No zombie tick loop
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&connection).is_empty());

    host.publish_ride_profile(ActiveRideProfile::new("Trainer", true));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = drain(&connection);

    assert_eq!(
        events[0],
        DeviceEvent::ConnectionStatus(ConnectionStatus::Connected)
    );
    let after = speeds(&events);
    assert!((after[0] - 2.5).abs() < 1e-9, "resumed at {}", after[0]);
}

/// Leaving indoor and closing the connection release every host subscription.
#[tokio::test(start_paused = true)]
async fn test_teardown_releases_subscriptions() {
    let host = host_with_profiles(75.0, true);
    host.publish_power(150.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(host.consumer_count(&power_key()), 1);
    assert_eq!(host.consumer_count(&TopicKey::UserProfile), 1);

    host.publish_ride_profile(ActiveRideProfile::new("Road", false));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(host.consumer_count(&power_key()), 0);

    host.publish_ride_profile(ActiveRideProfile::new("Trainer", true));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(host.consumer_count(&power_key()), 1);

    connection.close().await;
    assert_eq!(host.consumer_count(&power_key()), 0);
    assert_eq!(host.consumer_count(&TopicKey::UserProfile), 0);
    assert_eq!(host.consumer_count(&TopicKey::RideProfile), 0);
    assert_eq!(host.consumer_count(&TopicKey::Connection), 0);
}

/// Latest power wins between ticks.
#[tokio::test(start_paused = true)]
async fn test_last_power_value_wins() {
    let host = host_with_profiles(75.0, true);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    drain(&connection);

    host.publish_power(1000.0);
    host.publish_power(0.0);
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let speeds = speeds(&drain(&connection));
    assert!(!speeds.is_empty());
    assert!(speeds.iter().all(|s| *s == 0.0));
}

/// After power stops, speed decays and reaches zero.
#[tokio::test(start_paused = true)]
async fn test_coasting_to_a_stop() {
    let host = host_with_profiles(75.0, true);
    host.publish_power(250.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(5250)).await;
    let riding = speeds(&drain(&connection));
    assert!(*riding.last().unwrap() > 3.0);

    host.publish_stream(data_type::POWER, StreamState::NotAvailable);
    tokio::time::sleep(Duration::from_secs(20)).await;
    let coasting = speeds(&drain(&connection));

    for window in coasting.windows(2) {
        assert!(window[1] <= window[0]);
    }
    assert_eq!(*coasting.last().unwrap(), 0.0);
}

/// A new rider weight restarts the simulation.
#[tokio::test(start_paused = true)]
async fn test_profile_change_restarts() {
    let host = host_with_profiles(75.0, true);
    host.publish_power(300.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(3250)).await;
    drain(&connection);

    host.publish_user_profile(UserProfile::with_weight(68.0));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = drain(&connection);

    assert!(events.contains(&DeviceEvent::ConnectionStatus(ConnectionStatus::Connected)));
    assert!((speeds(&events)[0] - 2.5).abs() < 1e-9);
}

/// Host disconnect suspends emission.
#[tokio::test(start_paused = true)]
async fn test_host_disconnect_suspends() {
    let host = host_with_profiles(75.0, true);
    host.set_connected(true);
    host.publish_power(200.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_millis(1250)).await;
    drain(&connection);

    host.set_connected(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = drain(&connection);
    assert_eq!(
        events.last(),
        Some(&DeviceEvent::ConnectionStatus(ConnectionStatus::Disconnected))
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&connection).is_empty());
}

/// A host already disconnected at connect time never sees the device connect.
#[tokio::test(start_paused = true)]
async fn test_host_disconnected_at_connect_stays_disconnected() {
    let host = host_with_profiles(75.0, true);
    host.set_connected(false);
    host.publish_power(200.0);
    let (_extension, connection) = connect(&host).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        drain(&connection),
        vec![DeviceEvent::ConnectionStatus(ConnectionStatus::Disconnected)]
    );
    assert_eq!(host.consumer_count(&power_key()), 0);

    host.set_connected(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let events = drain(&connection);
    assert_eq!(
        events[0],
        DeviceEvent::ConnectionStatus(ConnectionStatus::Connected)
    );
    assert!((speeds(&events)[0] - 2.5).abs() < 1e-9);
}
