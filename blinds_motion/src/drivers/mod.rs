//! Coil driver implementations.
//!
//! - [`simulation`] - Records patterns in memory for development and testing
//! - [`sysfs`] - Linux `/sys/class/gpio` output lines
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `CoilDriver` trait from `blinds_common::motor::driver`
//! 3. Register the driver in [`register_all_drivers`]

pub mod simulation;
pub mod sysfs;

use crate::driver_registry::DriverRegistry;
use blinds_common::motor::driver::CoilDriver;

/// Factory for the simulation driver.
pub fn create_simulation_driver() -> Box<dyn CoilDriver> {
    Box::new(simulation::SimulatedCoils::new())
}

/// Factory for the sysfs GPIO driver.
pub fn create_sysfs_driver() -> Box<dyn CoilDriver> {
    Box::new(sysfs::SysfsCoils::new())
}

/// Register every built-in driver.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", create_simulation_driver);
    registry.register("sysfs", create_sysfs_driver);
}
