//! # lvmd
//!
//! Host-local logical volume daemon.
//!
//! Routes volume requests to storage pools grouped into named device
//! classes, reports their inventory and free capacity, and streams a change
//! notification to every watcher whenever any pool's inventory changes.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Watch Handler (ws/)
//!     │
//!     ├── InventoryService, VolumeService (service/)
//!     ├── Broker (domain/)
//!     │
//!     ├── DeviceClassRegistry (domain/)
//!     │
//!     └── VolumeDriver (driver/): lvm(8) or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod driver;
pub mod error;
pub mod service;
pub mod ws;
