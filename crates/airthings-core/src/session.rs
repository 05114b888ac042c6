//! Polling session over a set of Airthings devices.
//!
//! A [`DeviceSession`] owns the device table and wraps every backend call in
//! the configured bounded retry.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//! use airthings_core::{DeviceSession, MockBackend, MockSensor, RetryConfig, Setup};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mac = "aa:bb:cc:dd:ee:ff".parse().unwrap();
//!     let backend = MockBackend::builder()
//!         .device(mac, MockSensor::wave_plus("2930012345"))
//!         .build();
//!
//!     let mut session = DeviceSession::new(backend, RetryConfig::new(3, Duration::from_secs(1)));
//!     let configured = BTreeMap::from([(mac, "Basement".to_string())]);
//!     assert_eq!(session.setup(configured).await.unwrap(), Setup::Configured);
//!
//!     session.fetch_device_info().await.unwrap();
//!     let readings = session.fetch_readings().await.unwrap();
//!     assert!(!readings.is_empty());
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use time::OffsetDateTime;
use tracing::{error, info, warn};

use airthings_types::{
    DATE_TIME_FIELD, DeviceInfo, MacAddress, SensorData, SensorDescriptor, SensorValue,
};

use crate::error::{Result, SessionError};
use crate::retry::{RetryConfig, with_retry};
use crate::traits::{SensorBackend, SensorMap};

/// Name given to devices that were not named in the configuration.
pub const DEFAULT_DEVICE_NAME: &str = "Airthings";

/// A device being polled.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Bluetooth address.
    pub mac: MacAddress,
    /// Display name chosen by the user.
    pub name: String,
    /// Identity read from the device, once known.
    pub info: Option<DeviceInfo>,
    /// Sensor characteristics found on the device.
    pub sensors: Vec<SensorDescriptor>,
}

impl Device {
    fn new(mac: MacAddress, name: String) -> Self {
        Self {
            mac,
            name,
            info: None,
            sensors: Vec::new(),
        }
    }
}

/// Outcome of [`DeviceSession::setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setup {
    /// The configured devices are ready to be polled.
    Configured,
    /// No devices were configured; these were found nearby instead.
    Discovered(Vec<MacAddress>),
}

/// One raw value from one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading<'a> {
    pub mac: MacAddress,
    pub field: &'a str,
    pub value: &'a SensorValue,
    pub taken_at: OffsetDateTime,
}

/// Everything read in one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Readings {
    /// When the poll returned.
    pub taken_at: OffsetDateTime,
    /// Values per device.
    pub data: BTreeMap<MacAddress, SensorData>,
}

impl Readings {
    /// `true` if no device returned a measurement. A timestamp on its own
    /// does not count.
    pub fn is_empty(&self) -> bool {
        self.data
            .values()
            .all(|d| d.keys().all(|field| field == DATE_TIME_FIELD))
    }

    /// Iterate over every value, device by device.
    pub fn iter(&self) -> impl Iterator<Item = SensorReading<'_>> {
        self.data.iter().flat_map(move |(mac, values)| {
            values.iter().map(move |(field, value)| SensorReading {
                mac: *mac,
                field,
                value,
                taken_at: self.taken_at,
            })
        })
    }
}

/// Polling session generic over the sensor backend.
pub struct DeviceSession<B> {
    backend: B,
    retry: RetryConfig,
    devices: BTreeMap<MacAddress, Device>,
}

impl<B: std::fmt::Debug> std::fmt::Debug for DeviceSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("backend", &self.backend)
            .field("retry", &self.retry)
            .field("devices", &self.devices.len())
            .finish()
    }
}

impl<B: SensorBackend> DeviceSession<B> {
    /// Create a session with no devices.
    pub fn new(backend: B, retry: RetryConfig) -> Self {
        Self {
            backend,
            retry,
            devices: BTreeMap::new(),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The devices being polled, by address.
    pub fn devices(&self) -> &BTreeMap<MacAddress, Device> {
        &self.devices
    }

    /// Look up one device.
    pub fn device(&self, mac: &MacAddress) -> Option<&Device> {
        self.devices.get(mac)
    }

    /// Register the devices to poll.
    ///
    /// A non-empty `configured` map (address to display name) is taken as
    /// is. An empty one runs a single discovery scan and reports what it
    /// found without registering anything.
    pub async fn setup(
        &mut self,
        configured: BTreeMap<MacAddress, String>,
    ) -> std::result::Result<Setup, SessionError> {
        if !configured.is_empty() {
            self.devices = configured
                .into_iter()
                .map(|(mac, name)| (mac, Device::new(mac, name)))
                .collect();
            info!("Polling {} configured device(s)", self.devices.len());
            return Ok(Setup::Configured);
        }

        info!("No devices configured, scanning for Airthings devices...");
        let found = self.backend.discover().await.map_err(|e| {
            error!("Failed to discover devices: {}", e);
            SessionError::Discovery(e)
        })?;
        if found.is_empty() {
            error!("No Airthings devices found");
            return Err(SessionError::NoDevicesFound);
        }
        info!("Found {} Airthings device(s)", found.len());
        Ok(Setup::Discovered(found))
    }

    /// Read identity and sensor lists of every device.
    pub async fn fetch_device_info(&mut self) -> std::result::Result<(), SessionError> {
        let macs: Vec<MacAddress> = self.devices.keys().copied().collect();

        let infos = self
            .retrying("get_info", || self.backend.get_info(&macs))
            .await?;
        for (mac, info) in infos {
            if let Some(device) = self.devices.get_mut(&mac) {
                info!("{} ({}): {}", device.name, mac, info);
                device.info = Some(info);
            }
        }

        let sensors = self
            .retrying("get_sensors", || self.backend.get_sensors(&macs))
            .await?;
        for (mac, found) in sensors {
            if let Some(device) = self.devices.get_mut(&mac) {
                device.sensors = found;
            }
        }
        Ok(())
    }

    /// Poll every device once.
    pub async fn fetch_readings(&self) -> std::result::Result<Readings, SessionError> {
        let sensors: SensorMap = self
            .devices
            .values()
            .map(|d| (d.mac, d.sensors.clone()))
            .collect();

        let data = self
            .retrying("get_sensor_data", || self.backend.get_sensor_data(&sensors))
            .await?;
        Ok(Readings {
            taken_at: OffsetDateTime::now_utc(),
            data,
        })
    }

    async fn retrying<F, Fut, T>(
        &self,
        operation: &'static str,
        call: F,
    ) -> std::result::Result<T, SessionError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = AtomicU32::new(0);
        with_retry(&self.retry, operation, || {
            attempts.fetch_add(1, Ordering::Relaxed);
            call()
        })
        .await
        .map_err(|source| {
            let attempts = attempts.load(Ordering::Relaxed);
            warn!("{} failed after {} attempt(s): {}", operation, attempts, source);
            SessionError::RetriesExhausted {
                operation,
                attempts,
                source,
            }
        })
    }
}
