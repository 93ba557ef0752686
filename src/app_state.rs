//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::{Broker, DeviceClassRegistry};
use crate::driver::VolumeDriver;
use crate::service::{InventoryService, VolumeService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only volume and capacity queries.
    pub inventory: Arc<InventoryService>,
    /// Volume mutations.
    pub volumes: Arc<VolumeService>,
    /// Change broker for watch subscriptions.
    pub broker: Broker,
    /// Fires on daemon shutdown; every watch runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wires the services around one registry, driver and broker.
    #[must_use]
    pub fn new(
        registry: DeviceClassRegistry,
        driver: Arc<dyn VolumeDriver>,
        shutdown: CancellationToken,
    ) -> Self {
        let registry = Arc::new(registry);
        let broker = Broker::new();
        let inventory = InventoryService::new(Arc::clone(&registry), Arc::clone(&driver));
        let volumes = VolumeService::new(registry, driver, broker.clone());
        Self {
            inventory: Arc::new(inventory),
            volumes: Arc::new(volumes),
            broker,
            shutdown,
        }
    }
}
