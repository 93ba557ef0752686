//! Service layer: request handling over the registry and the driver.
//!
//! [`InventoryService`] answers read-only volume and capacity queries.
//! [`VolumeService`] performs mutations and signals the
//! [`super::domain::Broker`] after each one succeeds.

pub mod inventory_service;
pub mod volume_service;

pub use inventory_service::InventoryService;
pub use volume_service::VolumeService;
