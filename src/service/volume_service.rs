//! Volume service: create, remove and resize volumes, then signal.

use std::sync::Arc;

use crate::domain::{Broker, DeviceClassRegistry, Volume};
use crate::driver::{LogicalVolume, VolumeDriver};
use crate::error::LvmdError;

/// Mutating volume operations.
///
/// Every method follows the pattern: validate → resolve device class →
/// call the driver → signal the [`Broker`] → return. The broker is only
/// signalled after a mutation succeeds.
#[derive(Debug, Clone)]
pub struct VolumeService {
    registry: Arc<DeviceClassRegistry>,
    driver: Arc<dyn VolumeDriver>,
    broker: Broker,
}

impl VolumeService {
    /// Creates a new `VolumeService`.
    #[must_use]
    pub fn new(
        registry: Arc<DeviceClassRegistry>,
        driver: Arc<dyn VolumeDriver>,
        broker: Broker,
    ) -> Self {
        Self {
            registry,
            driver,
            broker,
        }
    }

    /// Returns a reference to the inner [`Broker`].
    #[must_use]
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Creates a volume in the device class's pool using the class's
    /// creation defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::InvalidRequest`] for a bad name, size or tag,
    /// [`LvmdError::DeviceClassNotFound`] for an unknown class,
    /// [`LvmdError::InsufficientCapacity`] if the pool is too full,
    /// [`LvmdError::VolumeExists`] on a name clash and
    /// [`LvmdError::BackendUnavailable`] if the driver fails.
    pub async fn create_volume(
        &self,
        device_class: &str,
        name: &str,
        size_bytes: u64,
        tags: &[String],
    ) -> Result<Volume, LvmdError> {
        validate_volume_name(name)?;
        validate_size(size_bytes)?;
        for tag in tags {
            validate_tag(tag)?;
        }
        let class = self.registry.resolve(device_class)?;

        let free = self.driver.free_bytes(&class.volume_group).await?;
        if free < size_bytes {
            tracing::warn!(
                device_class = %class.name,
                free,
                requested = size_bytes,
                "not enough space left in pool"
            );
            return Err(LvmdError::InsufficientCapacity {
                requested: size_bytes,
                free,
            });
        }

        let request = class.creation_request(name, size_bytes, tags);
        let volume = self
            .driver
            .create_volume(&class.volume_group, &request)
            .await?;
        self.broker.signal();

        tracing::info!(device_class = %class.name, name, size_bytes = volume.size_bytes, "volume created");
        Ok(Volume::from(volume))
    }

    /// Removes a volume.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::DeviceClassNotFound`] for an unknown class,
    /// [`LvmdError::VolumeNotFound`] if the volume does not exist and
    /// [`LvmdError::BackendUnavailable`] if the driver fails.
    pub async fn remove_volume(&self, device_class: &str, name: &str) -> Result<(), LvmdError> {
        let class = self.registry.resolve(device_class)?;
        let volume = self.driver.find_volume(&class.volume_group, name).await?;
        self.driver.remove_volume(&volume).await?;
        self.broker.signal();

        tracing::info!(device_class = %class.name, name, "volume removed");
        Ok(())
    }

    /// Grows a volume to `size_bytes`.
    ///
    /// Volumes never shrink: a target at or below the current size leaves
    /// the volume untouched and does not signal.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_volume`], plus [`LvmdError::VolumeNotFound`].
    pub async fn resize_volume(
        &self,
        device_class: &str,
        name: &str,
        size_bytes: u64,
    ) -> Result<Volume, LvmdError> {
        validate_size(size_bytes)?;
        let class = self.registry.resolve(device_class)?;
        let volume = self.driver.find_volume(&class.volume_group, name).await?;
        if size_bytes <= volume.size_bytes {
            return Ok(Volume::from(volume));
        }

        let grow = size_bytes - volume.size_bytes;
        let free = self.driver.free_bytes(&class.volume_group).await?;
        if free < grow {
            return Err(LvmdError::InsufficientCapacity {
                requested: grow,
                free,
            });
        }
        self.driver.resize_volume(&volume, size_bytes).await?;
        self.broker.signal();

        // The resize already happened; a failed read-back only loses the
        // driver's rounding of the new size.
        let resized = match self.driver.find_volume(&class.volume_group, name).await {
            Ok(resized) => resized,
            Err(err) => {
                tracing::warn!(
                    device_class = %class.name,
                    name,
                    error = %err,
                    "resize read-back failed"
                );
                LogicalVolume {
                    size_bytes,
                    ..volume
                }
            }
        };
        tracing::info!(device_class = %class.name, name, size_bytes = resized.size_bytes, "volume resized");
        Ok(Volume::from(resized))
    }
}

fn validate_size(size_bytes: u64) -> Result<(), LvmdError> {
    if size_bytes == 0 {
        return Err(LvmdError::InvalidRequest(
            "size_bytes must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// LVM volume names: `[A-Za-z0-9+_.-]`, not starting with `-`.
fn validate_volume_name(name: &str) -> Result<(), LvmdError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+_.-".contains(c));
    if valid {
        Ok(())
    } else {
        Err(LvmdError::InvalidRequest(format!(
            "invalid volume name: {name:?}"
        )))
    }
}

/// LVM tags: `[A-Za-z0-9_+.-/=!:&#]`.
fn validate_tag(tag: &str) -> Result<(), LvmdError> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_+.-/=!:&#".contains(c));
    if valid {
        Ok(())
    } else {
        Err(LvmdError::InvalidRequest(format!("invalid tag: {tag:?}")))
    }
}
