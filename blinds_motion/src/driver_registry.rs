//! Driver registry for coil drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving coil
//! driver factories. Constructed at startup and passed by value; no global
//! state.

use blinds_common::motor::config::MotorConfig;
use blinds_common::motor::driver::{CoilDriver, DriverFactory, HalError};
use std::collections::HashMap;
use tracing::info;

use crate::drivers::register_all_drivers;

/// Registry of available coil drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `HalError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn CoilDriver>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// Create the driver named in `config` and initialize its lines.
    pub fn create_initialized(&self, config: &MotorConfig) -> Result<Box<dyn CoilDriver>, HalError> {
        let mut driver = self.create_driver(&config.driver)?;
        driver.init(config)?;
        info!("Created driver: {} v{}", driver.name(), driver.version());
        Ok(driver)
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::create_simulation_driver;

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test_driver", create_simulation_driver);

        let driver = reg.create_driver("test_driver").expect("should create");
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("nonexistent");
        assert!(matches!(result, Err(HalError::DriverNotFound(_))));
    }

    #[test]
    fn builtin_drivers_listed() {
        let mut names = DriverRegistry::with_builtin().list_drivers();
        names.sort();
        assert_eq!(names, vec!["simulation", "sysfs"]);
    }

    #[test]
    fn create_initialized_simulation() {
        let reg = DriverRegistry::with_builtin();
        let driver = reg.create_initialized(&MotorConfig::default()).unwrap();
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_simulation_driver);
        reg.register("dup", create_simulation_driver);
    }
}
