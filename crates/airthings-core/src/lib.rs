//! Core BLE library for Airthings environmental sensors.
//!
//! This crate provides Bluetooth Low Energy (BLE) access to Airthings Wave,
//! Wave Plus, Wave 2 and Wave Mini sensors, and a polling session that wraps
//! every device call in a bounded retry.
//!
//! # Features
//!
//! - **Device discovery**: Scan for nearby Airthings devices via BLE
//! - **Readings**: radon, CO₂, VOC, temperature, humidity, pressure,
//!   illuminance and battery voltage
//! - **Retry logic**: fixed attempt count and wait, with failure classification
//! - **Testing**: [`MockBackend`] with failure injection and call counting
//!
//! # Supported Devices
//!
//! | Device | Sensors |
//! |--------|---------|
//! | Wave (1st gen) | Radon, Temperature, Humidity, Illuminance |
//! | Wave Plus | Radon, CO₂, VOC, Temperature, Humidity, Pressure, Illuminance, Battery |
//! | Wave 2 | Radon, Temperature, Humidity |
//! | Wave Mini | VOC, Temperature, Humidity, Illuminance, Battery |
//!
//! # Platform Differences
//!
//! Devices are identified by their Bluetooth MAC address. CoreBluetooth on
//! macOS does not expose MAC addresses, so devices found there are skipped.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use airthings_core::{DeviceSession, RetryConfig, ScanOptions, Setup, WaveBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = WaveBackend::new(ScanOptions::default()).await?;
//!     let mut session = DeviceSession::new(backend, RetryConfig::default());
//!
//!     let mac = "aa:bb:cc:dd:ee:ff".parse()?;
//!     let setup = session.setup(BTreeMap::from([(mac, "Living room".into())])).await?;
//!     assert_eq!(setup, Setup::Configured);
//!
//!     session.fetch_device_info().await?;
//!     for reading in session.fetch_readings().await?.iter() {
//!         println!("{} {} = {}", reading.mac, reading.field, reading.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod mock;
pub mod retry;
pub mod scan;
pub mod session;
pub mod traits;
pub mod util;

// Re-export the shared types so callers need only one dependency
pub use airthings_types::types;
pub use airthings_types::uuid;

// Core exports
pub use backend::WaveBackend;
pub use device::{ConnectionConfig, Device};
pub use error::{DeviceNotFoundReason, Error, FailureKind, Result, SessionError};
pub use mock::{MockBackend, MockBackendBuilder, MockOperation, MockSensor};
pub use retry::{RetryConfig, with_retry};
pub use scan::{DiscoveredDevice, ScanOptions};
pub use session::{
    DEFAULT_DEVICE_NAME, Device as SessionDevice, DeviceSession, Readings, SensorReading, Setup,
};
pub use traits::{SensorBackend, SensorMap};
pub use util::{bdaddr_from_mac, mac_from_bdaddr};

// Re-export from airthings-types
pub use airthings_types::{
    DATE_TIME_FIELD, Decoder, DeviceInfo, MacAddress, ParseError, SensorData, SensorDescriptor,
    SensorValue,
};
