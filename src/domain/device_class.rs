//! Device class definitions and their validation rules.
//!
//! A [`DeviceClass`] names a storage tier and maps it to one volume group.
//! Definitions are deserialized from the `device-classes` list of the
//! daemon's YAML configuration file.

use serde::{Deserialize, Serialize};

use crate::driver::CreateVolume;
use crate::error::LvmdError;

/// Spare capacity reserved when a class does not configure `spare-gb`.
pub const DEFAULT_SPARE_GB: u64 = 10;

/// A named logical storage tier backed by one volume group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceClass {
    /// Unique device-class name.
    pub name: String,
    /// Backing volume group (pool identifier).
    pub volume_group: String,
    /// Whether this class serves requests that name no device class.
    #[serde(default)]
    pub default: bool,
    /// Reserved headroom in GiB. Falls back to [`DEFAULT_SPARE_GB`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spare_gb: Option<u64>,
    /// Default stripe count for new volumes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe: Option<u32>,
    /// Default stripe size for new volumes (e.g. `64k`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_size: Option<String>,
    /// Extra flags passed to every volume creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lvcreate_options: Vec<String>,
}

impl DeviceClass {
    /// Creates a class with no spare override and no creation defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, volume_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume_group: volume_group.into(),
            default: false,
            spare_gb: None,
            stripe: None,
            stripe_size: None,
            lvcreate_options: Vec::new(),
        }
    }

    /// Sets the reserved spare capacity in GiB.
    #[must_use]
    pub fn with_spare_gb(mut self, spare_gb: u64) -> Self {
        self.spare_gb = Some(spare_gb);
        self
    }

    /// Marks this class as the default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Reserved spare capacity in bytes.
    #[must_use]
    pub fn spare_bytes(&self) -> u64 {
        self.spare_gb
            .unwrap_or(DEFAULT_SPARE_GB)
            .saturating_mul(1 << 30)
    }

    /// Builds a driver creation request carrying this class's defaults.
    #[must_use]
    pub fn creation_request(&self, name: &str, size_bytes: u64, tags: &[String]) -> CreateVolume {
        CreateVolume {
            name: name.to_string(),
            size_bytes,
            tags: tags.to_vec(),
            stripe: self.stripe,
            stripe_size: self.stripe_size.clone(),
            extra_options: self.lvcreate_options.clone(),
        }
    }

    /// Checks the per-class rules.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::Config`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), LvmdError> {
        if !is_valid_class_name(&self.name) {
            return Err(LvmdError::Config(format!(
                "invalid device class name: {:?}",
                self.name
            )));
        }
        if self.volume_group.is_empty() {
            return Err(LvmdError::Config(format!(
                "device class {}: volume-group is required",
                self.name
            )));
        }
        if self.stripe == Some(0) {
            return Err(LvmdError::Config(format!(
                "device class {}: stripe must be at least 1",
                self.name
            )));
        }
        if let Some(size) = &self.stripe_size
            && !is_valid_stripe_size(size)
        {
            return Err(LvmdError::Config(format!(
                "device class {}: invalid stripe-size {size:?}",
                self.name
            )));
        }
        Ok(())
    }
}

fn is_valid_class_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
}

/// Digits with an optional single unit suffix, as `lvcreate -I` accepts.
fn is_valid_stripe_size(size: &str) -> bool {
    let digits = size.trim_end_matches(|c: char| "bBsSkKmMgGtTpPeE".contains(c));
    let suffix_len = size.len() - digits.len();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && suffix_len <= 1
}
