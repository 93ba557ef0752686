//! Volume-pool drivers: the boundary to the host's volume manager.
//!
//! The [`VolumeDriver`] trait is the only way the daemon touches a pool.
//! [`LvmDriver`] shells out to the `lvm` tooling; [`InMemoryDriver`] keeps
//! pools in process memory for tests and local development.

pub mod lvm;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

pub use lvm::LvmDriver;
pub use memory::InMemoryDriver;

/// A logical volume as reported by a driver.
///
/// Doubles as the handle passed back to [`VolumeDriver::remove_volume`] and
/// [`VolumeDriver::resize_volume`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalVolume {
    /// Pool (volume group) the volume lives in.
    pub pool: String,
    /// Volume name, unique within its pool.
    pub name: String,
    /// Allocated size in bytes.
    pub size_bytes: u64,
    /// Tags attached at creation.
    pub tags: Vec<String>,
}

/// Parameters for [`VolumeDriver::create_volume`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVolume {
    /// Name of the new volume.
    pub name: String,
    /// Requested size in bytes.
    pub size_bytes: u64,
    /// Tags to attach.
    pub tags: Vec<String>,
    /// Number of stripes, if striping is requested.
    pub stripe: Option<u32>,
    /// Stripe size in LVM notation (e.g. `64k`).
    pub stripe_size: Option<String>,
    /// Extra flags appended to the creation command.
    pub extra_options: Vec<String>,
}

/// Failures reported by a [`VolumeDriver`].
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The pool does not exist on this host.
    #[error("pool not found: {0}")]
    PoolMissing(String),

    /// The volume does not exist in the pool.
    #[error("volume {name} not found in pool {pool}")]
    VolumeNotFound {
        /// Pool that was searched.
        pool: String,
        /// Requested volume name.
        name: String,
    },

    /// A volume with the same name already exists.
    #[error("volume {0} already exists")]
    VolumeExists(String),

    /// Not enough free space for the allocation.
    #[error("insufficient space: free={free}, requested={requested}")]
    InsufficientSpace {
        /// Bytes requested.
        requested: u64,
        /// Bytes available.
        free: u64,
    },

    /// The volume-manager command exited unsuccessfully.
    #[error("{command} failed: {stderr}")]
    Command {
        /// Subcommand that failed (e.g. `lvcreate`).
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The command output could not be parsed.
    #[error("unexpected output from {command}: {detail}")]
    Parse {
        /// Subcommand whose output was rejected.
        command: String,
        /// What was wrong with it.
        detail: String,
    },

    /// Spawning the command failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability interface over one host's volume manager.
///
/// Implementations must be safe to call concurrently; any consistency
/// guarantee for a single query comes from the implementation itself.
#[async_trait]
pub trait VolumeDriver: Send + Sync + fmt::Debug {
    /// Lists every volume in `pool`.
    async fn list_volumes(&self, pool: &str) -> Result<Vec<LogicalVolume>, DriverError>;

    /// Creates a volume in `pool` and returns its handle.
    async fn create_volume(
        &self,
        pool: &str,
        request: &CreateVolume,
    ) -> Result<LogicalVolume, DriverError>;

    /// Removes the volume identified by `volume`.
    async fn remove_volume(&self, volume: &LogicalVolume) -> Result<(), DriverError>;

    /// Grows `volume` to `size_bytes`.
    async fn resize_volume(
        &self,
        volume: &LogicalVolume,
        size_bytes: u64,
    ) -> Result<(), DriverError>;

    /// Returns the number of unallocated bytes in `pool`.
    async fn free_bytes(&self, pool: &str) -> Result<u64, DriverError>;

    /// Looks up a single volume by name.
    async fn find_volume(&self, pool: &str, name: &str) -> Result<LogicalVolume, DriverError> {
        self.list_volumes(pool)
            .await?
            .into_iter()
            .find(|lv| lv.name == name)
            .ok_or_else(|| DriverError::VolumeNotFound {
                pool: pool.to_string(),
                name: name.to_string(),
            })
    }
}
