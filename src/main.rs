//! lvmd server entry point.
//!
//! Loads the device classes, picks a volume driver and serves the REST and
//! watch endpoints until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lvmd::api;
use lvmd::app_state::AppState;
use lvmd::config::{DaemonConfig, DeviceClassFile, DriverKind};
use lvmd::domain::DeviceClassRegistry;
use lvmd::driver::{InMemoryDriver, LvmDriver, VolumeDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::from_env().context("loading daemon configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let file = DeviceClassFile::load(&config.config_path)
        .with_context(|| format!("reading {}", config.config_path.display()))?;
    let registry =
        DeviceClassRegistry::new(file.device_classes).context("validating device classes")?;
    tracing::info!(
        addr = %config.listen_addr,
        device_classes = registry.len(),
        driver = ?config.driver,
        "starting lvmd"
    );

    let driver: Arc<dyn VolumeDriver> = match config.driver {
        DriverKind::Lvm => Arc::new(LvmDriver::new(&config.lvm_path)),
        DriverKind::Memory => {
            let capacity = config.memory_pool_capacity_gb.saturating_mul(1 << 30);
            let driver = registry
                .list()
                .iter()
                .fold(InMemoryDriver::new(), |driver, class| {
                    driver.with_pool(&class.volume_group, capacity)
                });
            Arc::new(driver)
        }
    };

    let shutdown = CancellationToken::new();
    let app_state = AppState::new(registry, driver, shutdown.clone());
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await
        .context("serving HTTP")?;

    Ok(())
}
