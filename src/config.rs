//! Daemon configuration.
//!
//! Process settings come from environment variables (or a `.env` file via
//! `dotenvy`). The device-class list lives in a YAML file whose path is
//! itself configurable:
//!
//! ```yaml
//! device-classes:
//!   - name: ssd
//!     volume-group: vg-ssd
//!     default: true
//!     spare-gb: 10
//!   - name: hdd
//!     volume-group: vg-hdd
//!     stripe: 2
//!     stripe-size: 64k
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::domain::DeviceClass;
use crate::error::LvmdError;

/// Which volume driver the daemon runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// The host's LVM tooling.
    Lvm,
    /// Pools kept in memory, for development.
    Memory,
}

impl FromStr for DriverKind {
    type Err = LvmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lvm" => Ok(Self::Lvm),
            "memory" => Ok(Self::Memory),
            other => Err(LvmdError::Config(format!("unknown driver: {other}"))),
        }
    }
}

/// Top-level daemon configuration.
///
/// Loaded once at startup via [`DaemonConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Path of the YAML file holding the device classes.
    pub config_path: PathBuf,

    /// Volume driver selection.
    pub driver: DriverKind,

    /// Path of the `lvm` binary.
    pub lvm_path: PathBuf,

    /// Capacity of each in-memory pool, in GiB.
    pub memory_pool_capacity_gb: u64,

    /// Timeout in seconds for unary requests.
    pub request_timeout_secs: u64,

    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl DaemonConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::Config`] if `LISTEN_ADDR` or `LVMD_DRIVER` is
    /// set but cannot be parsed.
    pub fn from_env() -> Result<Self, LvmdError> {
        dotenvy::dotenv().ok();

        let listen_addr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:9420".to_string());
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|e| LvmdError::Config(format!("LISTEN_ADDR {listen_addr:?}: {e}")))?;

        let driver = std::env::var("LVMD_DRIVER")
            .unwrap_or_else(|_| "lvm".to_string())
            .parse()?;

        Ok(Self {
            listen_addr,
            config_path: parse_env("LVMD_CONFIG", PathBuf::from("/etc/lvmd/lvmd.yaml")),
            driver,
            lvm_path: parse_env("LVM_PATH", PathBuf::from("/sbin/lvm")),
            memory_pool_capacity_gb: parse_env("MEMORY_POOL_CAPACITY_GB", 100),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

/// The device-class section of the YAML configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceClassFile {
    /// Device classes in configuration order.
    pub device_classes: Vec<DeviceClass>,
}

impl DeviceClassFile {
    /// Parses the YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::Config`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, LvmdError> {
        serde_yaml::from_str(yaml).map_err(|e| LvmdError::Config(e.to_string()))
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LvmdError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| LvmdError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&yaml)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
