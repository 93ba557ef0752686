//! Device-class listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DeviceClass;

/// One configured device class.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceClassDto {
    /// Device-class name.
    pub name: String,
    /// Backing volume group.
    pub volume_group: String,
    /// Whether requests without a device class land here.
    pub default: bool,
    /// Reserved spare capacity in bytes.
    pub spare_bytes: u64,
}

impl From<&DeviceClass> for DeviceClassDto {
    fn from(class: &DeviceClass) -> Self {
        Self {
            name: class.name.clone(),
            volume_group: class.volume_group.clone(),
            default: class.default,
            spare_bytes: class.spare_bytes(),
        }
    }
}

/// Response body for `GET /device-classes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceClassListResponse {
    /// Classes in configuration order.
    pub device_classes: Vec<DeviceClassDto>,
}
