//! Volume DTOs for list, create and resize operations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Volume;

/// Query string selecting a device class. Omitted or empty selects the
/// default class.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceClassQuery {
    /// Device-class name.
    #[serde(default)]
    pub device_class: String,
}

/// Request body for `POST /volumes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVolumeRequest {
    /// Target device class; omitted selects the default class.
    #[serde(default)]
    pub device_class: String,
    /// Volume name.
    pub name: String,
    /// Requested size in bytes.
    pub size_bytes: u64,
    /// Tags to attach.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for `POST /volumes/{name}/resize`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResizeVolumeRequest {
    /// Device class holding the volume; omitted selects the default class.
    #[serde(default)]
    pub device_class: String,
    /// New size in bytes. Smaller than the current size is a no-op.
    pub size_bytes: u64,
}

/// Response body for `GET /volumes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VolumeListResponse {
    /// Volumes in the pool.
    pub volumes: Vec<Volume>,
}
