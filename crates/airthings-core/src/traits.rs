//! Trait abstractions for Airthings sensor access.
//!
//! This module provides the [`SensorBackend`] trait that abstracts over the
//! real Bluetooth stack and mock backends for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;

use airthings_types::{DeviceInfo, MacAddress, SensorData, SensorDescriptor};

use crate::error::Result;

/// Sensors found on each device, keyed by MAC.
pub type SensorMap = BTreeMap<MacAddress, Vec<SensorDescriptor>>;

/// Trait abstracting the four calls the bridge makes against its devices.
///
/// Every call is batch-shaped: it takes all device addresses at once and
/// returns one entry per device that answered. A device that could not be
/// reached makes the whole call fail, which the session then retries.
///
/// # Example
///
/// ```ignore
/// use airthings_core::{SensorBackend, Result};
///
/// async fn print_co2<B: SensorBackend>(backend: &B) -> Result<()> {
///     let macs = backend.discover().await?;
///     let sensors = backend.get_sensors(&macs).await?;
///     for (mac, data) in backend.get_sensor_data(&sensors).await? {
///         println!("{mac}: {:?}", data.get("co2"));
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SensorBackend: Send + Sync {
    /// Scan for nearby Airthings devices.
    async fn discover(&self) -> Result<Vec<MacAddress>>;

    /// Read identity information from each device.
    async fn get_info(&self, macs: &[MacAddress]) -> Result<BTreeMap<MacAddress, DeviceInfo>>;

    /// List the sensor characteristics present on each device.
    async fn get_sensors(&self, macs: &[MacAddress]) -> Result<SensorMap>;

    /// Read and decode every listed sensor.
    async fn get_sensor_data(&self, sensors: &SensorMap)
    -> Result<BTreeMap<MacAddress, SensorData>>;
}
