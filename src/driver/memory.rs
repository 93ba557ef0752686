//! In-memory volume driver.
//!
//! Pools live in a `HashMap` behind a [`tokio::sync::RwLock`]. Allocations
//! are rounded up to whole extents the same way LVM rounds them, so sizes
//! reported here match what a real volume group would report.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CreateVolume, DriverError, LogicalVolume, VolumeDriver};

/// Default LVM physical extent size (4 MiB).
pub const EXTENT_BYTES: u64 = 4 << 20;

#[derive(Debug)]
struct MemoryPool {
    capacity: u64,
    volumes: BTreeMap<String, LogicalVolume>,
}

impl MemoryPool {
    fn used(&self) -> u64 {
        self.volumes.values().map(|lv| lv.size_bytes).sum()
    }

    fn free(&self) -> u64 {
        self.capacity.saturating_sub(self.used())
    }
}

/// Volume driver backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryDriver {
    pools: RwLock<HashMap<String, MemoryPool>>,
}

impl InMemoryDriver {
    /// Creates a driver with no pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty pool of `capacity` bytes, replacing any pool of the
    /// same name.
    #[must_use]
    pub fn with_pool(mut self, name: &str, capacity: u64) -> Self {
        self.pools.get_mut().insert(
            name.to_string(),
            MemoryPool {
                capacity,
                volumes: BTreeMap::new(),
            },
        );
        self
    }
}

/// Rounds `bytes` up to a whole number of extents.
#[must_use]
pub fn round_to_extent(bytes: u64) -> u64 {
    bytes.div_ceil(EXTENT_BYTES).saturating_mul(EXTENT_BYTES)
}

fn missing(pool: &str) -> DriverError {
    DriverError::PoolMissing(pool.to_string())
}

#[async_trait]
impl VolumeDriver for InMemoryDriver {
    async fn list_volumes(&self, pool: &str) -> Result<Vec<LogicalVolume>, DriverError> {
        let pools = self.pools.read().await;
        let entry = pools.get(pool).ok_or_else(|| missing(pool))?;
        Ok(entry.volumes.values().cloned().collect())
    }

    async fn create_volume(
        &self,
        pool: &str,
        request: &CreateVolume,
    ) -> Result<LogicalVolume, DriverError> {
        let mut pools = self.pools.write().await;
        let entry = pools.get_mut(pool).ok_or_else(|| missing(pool))?;
        if entry.volumes.contains_key(&request.name) {
            return Err(DriverError::VolumeExists(request.name.clone()));
        }
        let size_bytes = round_to_extent(request.size_bytes);
        let free = entry.free();
        if size_bytes > free {
            return Err(DriverError::InsufficientSpace {
                requested: size_bytes,
                free,
            });
        }
        let volume = LogicalVolume {
            pool: pool.to_string(),
            name: request.name.clone(),
            size_bytes,
            tags: request.tags.clone(),
        };
        entry.volumes.insert(request.name.clone(), volume.clone());
        tracing::debug!(pool, name = %volume.name, size_bytes, "memory volume created");
        Ok(volume)
    }

    async fn remove_volume(&self, volume: &LogicalVolume) -> Result<(), DriverError> {
        let mut pools = self.pools.write().await;
        let entry = pools
            .get_mut(&volume.pool)
            .ok_or_else(|| missing(&volume.pool))?;
        entry
            .volumes
            .remove(&volume.name)
            .map(|_| ())
            .ok_or_else(|| DriverError::VolumeNotFound {
                pool: volume.pool.clone(),
                name: volume.name.clone(),
            })
    }

    async fn resize_volume(
        &self,
        volume: &LogicalVolume,
        size_bytes: u64,
    ) -> Result<(), DriverError> {
        let mut pools = self.pools.write().await;
        let entry = pools
            .get_mut(&volume.pool)
            .ok_or_else(|| missing(&volume.pool))?;
        let free = entry.free();
        let Some(current) = entry.volumes.get_mut(&volume.name) else {
            return Err(DriverError::VolumeNotFound {
                pool: volume.pool.clone(),
                name: volume.name.clone(),
            });
        };
        let target = round_to_extent(size_bytes);
        let grow = target.saturating_sub(current.size_bytes);
        if grow > free {
            return Err(DriverError::InsufficientSpace {
                requested: grow,
                free,
            });
        }
        current.size_bytes = target;
        Ok(())
    }

    async fn free_bytes(&self, pool: &str) -> Result<u64, DriverError> {
        let pools = self.pools.read().await;
        pools.get(pool).map(MemoryPool::free).ok_or_else(|| missing(pool))
    }
}
