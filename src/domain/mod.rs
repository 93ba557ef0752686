//! Domain layer: device classes, response shapes and change notification.
//!
//! This module contains the daemon's domain model: device-class
//! definitions and their immutable registry, the volume and capacity
//! records returned to clients, and the broker that fans inventory change
//! signals out to watch subscribers.

pub mod broker;
pub mod device_class;
pub mod device_class_registry;
pub mod subscription_id;
pub mod volume;

pub use broker::{Broker, Subscription, WatchSink};
pub use device_class::DeviceClass;
pub use device_class_registry::DeviceClassRegistry;
pub use subscription_id::SubscriptionId;
pub use volume::{Capacity, Volume, WatchEvent};
