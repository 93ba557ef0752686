//! Response shapes produced by the inventory queries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::driver::LogicalVolume;

/// A logical volume as reported to clients. Built fresh per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Volume {
    /// Volume name.
    pub name: String,
    /// Size in whole GiB, truncated.
    pub size_gb: u64,
    /// Exact size in bytes.
    pub size_bytes: u64,
    /// Tags set at creation.
    pub tags: Vec<String>,
}

impl From<LogicalVolume> for Volume {
    fn from(lv: LogicalVolume) -> Self {
        Self {
            name: lv.name,
            size_gb: lv.size_bytes >> 30,
            size_bytes: lv.size_bytes,
            tags: lv.tags,
        }
    }
}

/// Free space of a device class after its spare reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Capacity {
    /// Bytes available for new volumes. Never negative.
    pub free_bytes: u64,
}

impl Capacity {
    /// Subtracts `spare` from the pool's free bytes, clamping at zero.
    #[must_use]
    pub const fn from_pool(pool_free: u64, spare: u64) -> Self {
        Self {
            free_bytes: pool_free.saturating_sub(spare),
        }
    }
}

/// A watch notification. Carries no payload: it only tells the receiver
/// that inventory may have changed and is worth re-reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WatchEvent {}
