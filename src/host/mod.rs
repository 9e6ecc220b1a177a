//! Host platform interface.
//!
//! The host owns the rider's profiles, the ride profile and the sensor
//! streams. Everything the extension needs from it goes through an explicitly
//! passed [`HostService`] handle.

pub mod local;
pub mod subscription;
pub mod types;

pub use local::{LocalHost, TopicKey};
pub use subscription::{Subscription, Topic};
pub use types::{
    data_type, field, ActiveRideProfile, DataPoint, SavedDevice, SavedDevices, StreamState, Units,
    UserProfile,
};

/// Streams exposed by the host platform.
///
/// Each call registers a new consumer that receives values until the returned
/// [`Subscription`] is dropped.
pub trait HostService: Send + Sync {
    /// Rider profile updates.
    fn subscribe_user_profile(&self) -> Subscription<UserProfile>;

    /// Active ride profile updates.
    fn subscribe_ride_profile(&self) -> Subscription<ActiveRideProfile>;

    /// Data stream updates for a data type id.
    fn subscribe_stream(&self, data_type_id: &str) -> Subscription<StreamState>;

    /// Saved sensor list updates.
    fn subscribe_saved_devices(&self) -> Subscription<SavedDevices>;

    /// Host connection flag.
    fn subscribe_connection(&self) -> Subscription<bool>;
}
