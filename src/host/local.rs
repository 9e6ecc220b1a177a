//! In-process host used by the headless runner and tests.

use crate::host::subscription::{Subscription, Topic};
use crate::host::types::{
    data_type, field, ActiveRideProfile, DataPoint, SavedDevices, StreamState, UserProfile,
};
use crate::host::HostService;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Identifies one of the host's streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicKey {
    UserProfile,
    RideProfile,
    SavedDevices,
    Connection,
    /// A data stream by data type id
    Stream(String),
}

#[derive(Default)]
struct Topics {
    user_profile: Topic<UserProfile>,
    ride_profile: Topic<ActiveRideProfile>,
    saved_devices: Topic<SavedDevices>,
    connection: Topic<bool>,
    streams: HashMap<String, Topic<StreamState>>,
}

impl Topics {
    fn stream(&mut self, data_type_id: &str) -> &mut Topic<StreamState> {
        self.streams.entry(data_type_id.to_string()).or_default()
    }
}

fn lock(topics: &Mutex<Topics>) -> MutexGuard<'_, Topics> {
    // A panicking publisher cannot leave a topic half-updated
    topics.lock().unwrap_or_else(|e| e.into_inner())
}

fn release(topics: Weak<Mutex<Topics>>, remove: impl FnOnce(&mut Topics)) {
    if let Some(topics) = topics.upgrade() {
        remove(&mut lock(&topics));
    }
}

/// A host whose streams are fed by explicit `publish_*` calls.
#[derive(Clone, Default)]
pub struct LocalHost {
    topics: Arc<Mutex<Topics>>,
}

impl LocalHost {
    /// Create a host with no published values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a user profile update.
    pub fn publish_user_profile(&self, profile: UserProfile) {
        tracing::debug!("Publishing user profile: {:?}", profile);
        lock(&self.topics).user_profile.publish(profile);
    }

    /// Publish an active ride profile update.
    pub fn publish_ride_profile(&self, profile: ActiveRideProfile) {
        tracing::debug!("Publishing ride profile: {:?}", profile);
        lock(&self.topics).ride_profile.publish(profile);
    }

    /// Publish the saved device list.
    pub fn publish_saved_devices(&self, devices: SavedDevices) {
        lock(&self.topics).saved_devices.publish(devices);
    }

    /// Publish the host connection flag.
    pub fn set_connected(&self, connected: bool) {
        tracing::debug!("Host connection: {}", connected);
        lock(&self.topics).connection.publish(connected);
    }

    /// Publish a state on a data stream.
    pub fn publish_stream(&self, data_type_id: &str, state: StreamState) {
        lock(&self.topics).stream(data_type_id).publish(state);
    }

    /// Publish a power reading in watts.
    pub fn publish_power(&self, watts: f64) {
        let point = DataPoint::single(data_type::POWER, field::POWER, watts, None);
        self.publish_stream(data_type::POWER, StreamState::Streaming(point));
    }

    /// Number of live consumers on a topic.
    pub fn consumer_count(&self, key: &TopicKey) -> usize {
        let topics = lock(&self.topics);
        match key {
            TopicKey::UserProfile => topics.user_profile.consumer_count(),
            TopicKey::RideProfile => topics.ride_profile.consumer_count(),
            TopicKey::SavedDevices => topics.saved_devices.consumer_count(),
            TopicKey::Connection => topics.connection.consumer_count(),
            TopicKey::Stream(id) => topics
                .streams
                .get(id)
                .map(|t| t.consumer_count())
                .unwrap_or(0),
        }
    }

    /// Last state published on a data stream.
    pub fn last_stream_state(&self, data_type_id: &str) -> Option<StreamState> {
        lock(&self.topics)
            .streams
            .get(data_type_id)
            .and_then(|t| t.last().cloned())
    }
}

impl HostService for LocalHost {
    fn subscribe_user_profile(&self) -> Subscription<UserProfile> {
        let (id, rx) = lock(&self.topics).user_profile.add();
        let topics = Arc::downgrade(&self.topics);
        Subscription::new(id, rx, move || {
            release(topics, |t| t.user_profile.remove(id))
        })
    }

    fn subscribe_ride_profile(&self) -> Subscription<ActiveRideProfile> {
        let (id, rx) = lock(&self.topics).ride_profile.add();
        let topics = Arc::downgrade(&self.topics);
        Subscription::new(id, rx, move || {
            release(topics, |t| t.ride_profile.remove(id))
        })
    }

    fn subscribe_stream(&self, data_type_id: &str) -> Subscription<StreamState> {
        let (id, rx) = lock(&self.topics).stream(data_type_id).add();
        let topics = Arc::downgrade(&self.topics);
        let key = data_type_id.to_string();
        Subscription::new(id, rx, move || {
            release(topics, |t| {
                if let Some(topic) = t.streams.get_mut(&key) {
                    topic.remove(id);
                }
            })
        })
    }

    fn subscribe_saved_devices(&self) -> Subscription<SavedDevices> {
        let (id, rx) = lock(&self.topics).saved_devices.add();
        let topics = Arc::downgrade(&self.topics);
        Subscription::new(id, rx, move || {
            release(topics, |t| t.saved_devices.remove(id))
        })
    }

    fn subscribe_connection(&self) -> Subscription<bool> {
        let (id, rx) = lock(&self.topics).connection.add();
        let topics = Arc::downgrade(&self.topics);
        Subscription::new(id, rx, move || {
            release(topics, |t| t.connection.remove(id))
        })
    }
}
