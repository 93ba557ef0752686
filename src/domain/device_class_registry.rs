//! Immutable device-class lookup table.
//!
//! [`DeviceClassRegistry`] is built once at startup and never mutated
//! afterwards, so lookups need no lock: handlers share it behind an `Arc`
//! and read it concurrently.

use std::collections::HashMap;

use super::DeviceClass;
use crate::error::LvmdError;

/// Maps device-class names to their definitions.
#[derive(Debug)]
pub struct DeviceClassRegistry {
    classes: Vec<DeviceClass>,
    by_name: HashMap<String, usize>,
    default_index: Option<usize>,
}

impl DeviceClassRegistry {
    /// Builds the registry from configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::Config`] if any class is invalid, two classes
    /// share a name, or more than one class is marked default.
    pub fn new(classes: Vec<DeviceClass>) -> Result<Self, LvmdError> {
        let mut by_name = HashMap::with_capacity(classes.len());
        let mut default_index = None;
        for (index, class) in classes.iter().enumerate() {
            class.validate()?;
            if by_name.insert(class.name.clone(), index).is_some() {
                return Err(LvmdError::Config(format!(
                    "duplicate device class name: {}",
                    class.name
                )));
            }
            if class.default {
                if default_index.is_some() {
                    return Err(LvmdError::Config(
                        "multiple default device classes".to_string(),
                    ));
                }
                default_index = Some(index);
            }
        }
        Ok(Self {
            classes,
            by_name,
            default_index,
        })
    }

    /// Resolves a device-class name. The empty name selects the default
    /// class.
    ///
    /// # Errors
    ///
    /// Returns [`LvmdError::DeviceClassNotFound`] if no class matches.
    pub fn resolve(&self, name: &str) -> Result<&DeviceClass, LvmdError> {
        let index = if name.is_empty() {
            self.default_index
        } else {
            self.by_name.get(name).copied()
        };
        index
            .and_then(|i| self.classes.get(i))
            .ok_or_else(|| LvmdError::DeviceClassNotFound(name.to_string()))
    }

    /// Returns every class in configuration order.
    #[must_use]
    pub fn list(&self) -> &[DeviceClass] {
        &self.classes
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
