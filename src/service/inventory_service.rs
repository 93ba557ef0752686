//! Inventory service: read-only volume and capacity queries.

use std::sync::Arc;

use crate::domain::{Capacity, DeviceClass, DeviceClassRegistry, Volume};
use crate::driver::VolumeDriver;
use crate::error::LvmdError;

/// Stateless query handlers over the device-class registry and the driver.
///
/// Holds no lock of its own: each query resolves the class, asks the
/// driver once and shapes the answer, so it runs concurrently with any
/// number of other queries and mutations.
#[derive(Debug, Clone)]
pub struct InventoryService {
    registry: Arc<DeviceClassRegistry>,
    driver: Arc<dyn VolumeDriver>,
}

impl InventoryService {
    /// Creates a new `InventoryService`.
    #[must_use]
    pub fn new(registry: Arc<DeviceClassRegistry>, driver: Arc<dyn VolumeDriver>) -> Self {
        Self { registry, driver }
    }

    /// Lists the volumes in a device class's pool.
    ///
    /// An empty pool yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::DeviceClassNotFound`] for an unknown class and
    /// [`LvmdError::BackendUnavailable`] if the driver fails.
    pub async fn list_volumes(&self, device_class: &str) -> Result<Vec<Volume>, LvmdError> {
        let class = self.registry.resolve(device_class)?;
        let volumes = self.driver.list_volumes(&class.volume_group).await?;
        tracing::debug!(
            device_class = %class.name,
            count = volumes.len(),
            "listed volumes"
        );
        Ok(volumes.into_iter().map(Volume::from).collect())
    }

    /// Returns the pool's free bytes minus the class's spare reservation,
    /// clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::DeviceClassNotFound`] for an unknown class and
    /// [`LvmdError::BackendUnavailable`] if the driver fails.
    pub async fn free_capacity(&self, device_class: &str) -> Result<Capacity, LvmdError> {
        let class = self.registry.resolve(device_class)?;
        let pool_free = self.driver.free_bytes(&class.volume_group).await?;
        Ok(Capacity::from_pool(pool_free, class.spare_bytes()))
    }

    /// Returns every configured device class.
    #[must_use]
    pub fn device_classes(&self) -> &[DeviceClass] {
        self.registry.list()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Broker;
    use crate::driver::InMemoryDriver;
    use crate::service::VolumeService;

    const GIB: u64 = 1 << 30;
    const POOL: u64 = 20 * GIB;

    fn make_services() -> (InventoryService, VolumeService) {
        let Ok(registry) = DeviceClassRegistry::new(vec![
            DeviceClass::new("ssd", "vg-ssd").with_spare_gb(1).as_default(),
            DeviceClass::new("hdd", "vg-hdd").with_spare_gb(0),
            DeviceClass::new("ghost", "vg-missing"),
        ]) else {
            panic!("valid registry");
        };
        let registry = Arc::new(registry);
        let driver: Arc<dyn VolumeDriver> = Arc::new(
            InMemoryDriver::new()
                .with_pool("vg-ssd", POOL)
                .with_pool("vg-hdd", POOL),
        );
        (
            InventoryService::new(Arc::clone(&registry), Arc::clone(&driver)),
            VolumeService::new(registry, driver, Broker::new()),
        )
    }

    #[tokio::test]
    async fn empty_pool_lists_nothing() {
        let (inventory, _) = make_services();
        let Ok(volumes) = inventory.list_volumes("ssd").await else {
            panic!("list failed");
        };
        assert!(volumes.is_empty());
    }

    #[tokio::test]
    async fn lists_created_volumes_with_tags() {
        let (inventory, volumes) = make_services();
        let Ok(_) = volumes
            .create_volume("ssd", "v1", GIB, &["t".to_string()])
            .await
        else {
            panic!("setup create failed");
        };
        let Ok(_) = volumes.create_volume("ssd", "v2", GIB, &[]).await else {
            panic!("setup create failed");
        };

        let Ok(list) = inventory.list_volumes("ssd").await else {
            panic!("list failed");
        };
        assert_eq!(list.len(), 2);
        let Some(v1) = list.iter().find(|v| v.name == "v1") else {
            panic!("v1 missing");
        };
        let Some(v2) = list.iter().find(|v| v.name == "v2") else {
            panic!("v2 missing");
        };
        assert_eq!(v1.tags, vec!["t".to_string()]);
        assert!(v2.tags.is_empty());
        assert_eq!(v1.size_gb, 1);
        assert_eq!(v2.size_gb, 1);
    }

    #[tokio::test]
    async fn classes_route_to_their_own_pool() {
        let (inventory, volumes) = make_services();
        let Ok(_) = volumes.create_volume("hdd", "v1", GIB, &[]).await else {
            panic!("setup create failed");
        };

        let ssd = inventory.list_volumes("ssd").await.ok().map(|v| v.len());
        let hdd = inventory.list_volumes("hdd").await.ok().map(|v| v.len());
        assert_eq!(ssd, Some(0));
        assert_eq!(hdd, Some(1));
    }

    #[tokio::test]
    async fn free_capacity_subtracts_spare() {
        let (inventory, volumes) = make_services();
        let Ok(before) = inventory.free_capacity("ssd").await else {
            panic!("capacity failed");
        };
        assert_eq!(before.free_bytes, POOL - GIB);

        let Ok(_) = volumes.create_volume("ssd", "v1", GIB, &[]).await else {
            panic!("setup create failed");
        };
        let Ok(after) = inventory.free_capacity("ssd").await else {
            panic!("capacity failed");
        };
        assert_eq!(after.free_bytes, POOL - GIB - GIB);

        let Ok(_) = volumes.remove_volume("ssd", "v1").await else {
            panic!("setup remove failed");
        };
        let restored = inventory.free_capacity("ssd").await.ok();
        assert_eq!(restored, Some(before));
    }

    #[tokio::test]
    async fn free_capacity_never_negative() {
        let (inventory, volumes) = make_services();
        let Ok(_) = volumes.create_volume("ssd", "big", POOL - GIB / 2, &[]).await else {
            panic!("setup create failed");
        };
        let Ok(capacity) = inventory.free_capacity("ssd").await else {
            panic!("capacity failed");
        };
        assert_eq!(capacity.free_bytes, 0);
    }

    #[tokio::test]
    async fn default_class_answers_empty_name() {
        let (inventory, _) = make_services();
        let by_default = inventory.free_capacity("").await.ok();
        let by_name = inventory.free_capacity("ssd").await.ok();
        assert_eq!(by_default, by_name);
    }

    #[tokio::test]
    async fn unknown_class_is_not_found() {
        let (inventory, _) = make_services();
        assert!(matches!(
            inventory.list_volumes("nvme").await,
            Err(LvmdError::DeviceClassNotFound(_))
        ));
        assert!(matches!(
            inventory.free_capacity("nvme").await,
            Err(LvmdError::DeviceClassNotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_pool_is_backend_unavailable() {
        let (inventory, _) = make_services();
        assert!(matches!(
            inventory.list_volumes("ghost").await,
            Err(LvmdError::BackendUnavailable(_))
        ));
        assert!(matches!(
            inventory.free_capacity("ghost").await,
            Err(LvmdError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn queries_run_alongside_mutations() {
        let (inventory, volumes) = make_services();
        let writer = {
            let volumes = volumes.clone();
            tokio::spawn(async move {
                for i in 0..16 {
                    let name = format!("v{i}");
                    let Ok(_) = volumes.create_volume("hdd", &name, GIB, &[]).await else {
                        panic!("create {name} failed");
                    };
                }
            })
        };
        for _ in 0..16 {
            let Ok(capacity) = inventory.free_capacity("hdd").await else {
                panic!("capacity failed mid-mutation");
            };
            let Ok(list) = inventory.list_volumes("hdd").await else {
                panic!("list failed mid-mutation");
            };
            assert!(capacity.free_bytes <= POOL);
            assert!(list.len() <= 16);
        }
        assert!(writer.await.is_ok());

        let total = inventory.list_volumes("hdd").await.ok().map(|v| v.len());
        assert_eq!(total, Some(16));
        let free = inventory.free_capacity("hdd").await.ok().map(|c| c.free_bytes);
        assert_eq!(free, Some(POOL - 16 * GIB));
    }
}
