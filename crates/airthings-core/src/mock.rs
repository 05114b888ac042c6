//! Mock backend implementation for testing.
//!
//! This module provides a mock backend that can be used for unit testing
//! without requiring actual BLE hardware.
//!
//! The [`MockBackend`] implements the [`SensorBackend`] trait, allowing it to
//! be used interchangeably with [`WaveBackend`](crate::WaveBackend) in
//! generic code.
//!
//! # Features
//!
//! - **Failure injection**: fail a given operation N times, or always, with
//!   a chosen [`FailureKind`] or a decoding [`ParseError`]
//! - **Call counting**: see how often each operation was attempted

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use airthings_types::ble::{COMMAND, WAVE_PLUS_DATA};
use airthings_types::{
    DeviceInfo, MacAddress, ParseError, SensorData, SensorDescriptor, SensorValue,
};

use crate::error::{Error, FailureKind, Result};
use crate::traits::{SensorBackend, SensorMap};

/// The operations of [`SensorBackend`], for failure injection and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    Discover,
    GetInfo,
    GetSensors,
    GetSensorData,
}

impl MockOperation {
    const ALL: [MockOperation; 4] = [
        MockOperation::Discover,
        MockOperation::GetInfo,
        MockOperation::GetSensors,
        MockOperation::GetSensorData,
    ];

    fn index(self) -> usize {
        match self {
            MockOperation::Discover => 0,
            MockOperation::GetInfo => 1,
            MockOperation::GetSensors => 2,
            MockOperation::GetSensorData => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            MockOperation::Discover => "discover",
            MockOperation::GetInfo => "get_info",
            MockOperation::GetSensors => "get_sensors",
            MockOperation::GetSensorData => "get_sensor_data",
        }
    }
}

/// One simulated device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockSensor {
    pub info: DeviceInfo,
    pub sensors: Vec<SensorDescriptor>,
    pub data: SensorData,
}

impl MockSensor {
    /// A Wave Plus with plausible readings.
    pub fn wave_plus(serial_nr: &str) -> Self {
        let service = uuid::Uuid::nil();
        let data = [
            ("date_time", SensorValue::from("2024-01-01T12:00:00")),
            ("humidity", SensorValue::from(45.0)),
            ("radon_1day_avg", SensorValue::from(61.0)),
            ("radon_longterm_avg", SensorValue::from(48.0)),
            ("temperature", SensorValue::from(21.37)),
            ("rel_atm_pressure", SensorValue::from(1012.34)),
            ("co2", SensorValue::from(612.0)),
            ("voc", SensorValue::from(85.0)),
            ("illuminance", SensorValue::from(12.0)),
            ("battery", SensorValue::from(2.9)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            info: DeviceInfo {
                manufacturer: "Airthings AS".to_string(),
                serial_nr: serial_nr.to_string(),
                model_nr: "2930".to_string(),
                device_name: "Airthings Wave+".to_string(),
            },
            sensors: vec![
                SensorDescriptor {
                    uuid: WAVE_PLUS_DATA,
                    service,
                },
                SensorDescriptor {
                    uuid: COMMAND,
                    service,
                },
            ],
            data,
        }
    }
}

/// A mock Airthings backend for testing.
///
/// # Example
///
/// ```
/// use airthings_core::{MockBackend, MockOperation, MockSensor, SensorBackend};
///
/// #[tokio::main]
/// async fn main() {
///     let mac = "aa:bb:cc:dd:ee:ff".parse().unwrap();
///     let backend = MockBackend::builder()
///         .device(mac, MockSensor::wave_plus("2930012345"))
///         .fail(MockOperation::GetInfo, 1)
///         .build();
///
///     assert!(backend.get_info(&[mac]).await.is_err());
///     assert!(backend.get_info(&[mac]).await.is_ok());
///     assert_eq!(backend.call_count(MockOperation::GetInfo), 2);
/// }
/// ```
#[derive(Debug)]
pub struct MockBackend {
    devices: RwLock<BTreeMap<MacAddress, MockSensor>>,
    discoverable: Vec<MacAddress>,
    failure_kind: FailureKind,
    /// Replaces `failure_kind` when set.
    parse_failure: Option<ParseError>,
    remaining_failures: [AtomicU32; 4],
    calls: [AtomicU32; 4],
}

impl MockBackend {
    /// Start building a mock backend.
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    /// Number of times `op` has been called.
    pub fn call_count(&self, op: MockOperation) -> u32 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Make the next `count` calls of `op` fail.
    pub fn set_failures(&self, op: MockOperation, count: u32) {
        self.remaining_failures[op.index()].store(count, Ordering::SeqCst);
    }

    /// Remaining injected failures for `op`.
    pub fn remaining_failures(&self, op: MockOperation) -> u32 {
        self.remaining_failures[op.index()].load(Ordering::SeqCst)
    }

    /// Set a single reading on a device.
    pub async fn set_value(&self, mac: MacAddress, field: &str, value: impl Into<SensorValue>) {
        if let Some(device) = self.devices.write().await.get_mut(&mac) {
            device.data.insert(field.to_string(), value.into());
        }
    }

    async fn enter(&self, op: MockOperation) -> Result<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);

        let remaining = &self.remaining_failures[op.index()];
        let failed = remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                match n {
                    0 => None,
                    u32::MAX => Some(u32::MAX),
                    n => Some(n - 1),
                }
            })
            .is_ok();
        if failed {
            return Err(self.injected_error(op));
        }
        Ok(())
    }

    fn injected_error(&self, op: MockOperation) -> Error {
        if let Some(err) = &self.parse_failure {
            return err.clone().into();
        }
        match self.failure_kind {
            FailureKind::TransientIo => Error::timeout(op.name(), Duration::from_secs(10)),
            FailureKind::UnreachableDevice => Error::NotConnected,
            FailureKind::MalformedData => {
                Error::InvalidData(format!("mock {} returned garbage", op.name()))
            }
        }
    }

    async fn lookup<T>(
        &self,
        macs: impl IntoIterator<Item = MacAddress>,
        f: impl Fn(&MockSensor) -> T,
    ) -> Result<BTreeMap<MacAddress, T>> {
        let devices = self.devices.read().await;
        macs.into_iter()
            .map(|mac| {
                devices
                    .get(&mac)
                    .map(|d| (mac, f(d)))
                    .ok_or_else(|| Error::device_not_found(mac.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl SensorBackend for MockBackend {
    async fn discover(&self) -> Result<Vec<MacAddress>> {
        self.enter(MockOperation::Discover).await?;
        Ok(self.discoverable.clone())
    }

    async fn get_info(&self, macs: &[MacAddress]) -> Result<BTreeMap<MacAddress, DeviceInfo>> {
        self.enter(MockOperation::GetInfo).await?;
        self.lookup(macs.iter().copied(), |d| d.info.clone()).await
    }

    async fn get_sensors(&self, macs: &[MacAddress]) -> Result<SensorMap> {
        self.enter(MockOperation::GetSensors).await?;
        self.lookup(macs.iter().copied(), |d| d.sensors.clone()).await
    }

    async fn get_sensor_data(
        &self,
        sensors: &SensorMap,
    ) -> Result<BTreeMap<MacAddress, SensorData>> {
        self.enter(MockOperation::GetSensorData).await?;
        self.lookup(sensors.keys().copied(), |d| d.data.clone()).await
    }
}

/// Builder for creating mock backends with custom settings.
#[derive(Debug)]
pub struct MockBackendBuilder {
    devices: BTreeMap<MacAddress, MockSensor>,
    discoverable: Vec<MacAddress>,
    failure_kind: FailureKind,
    parse_failure: Option<ParseError>,
    failures: [u32; 4],
}

impl Default for MockBackendBuilder {
    fn default() -> Self {
        Self {
            devices: BTreeMap::new(),
            discoverable: Vec::new(),
            failure_kind: FailureKind::TransientIo,
            parse_failure: None,
            failures: [0; 4],
        }
    }
}

impl MockBackendBuilder {
    /// Add a device. It also becomes discoverable.
    #[must_use]
    pub fn device(mut self, mac: MacAddress, sensor: MockSensor) -> Self {
        self.devices.insert(mac, sensor);
        if !self.discoverable.contains(&mac) {
            self.discoverable.push(mac);
        }
        self
    }

    /// Add a device that a scan does not report.
    #[must_use]
    pub fn hidden_device(mut self, mac: MacAddress, sensor: MockSensor) -> Self {
        self.devices.insert(mac, sensor);
        self
    }

    /// Fail the first `count` calls of `op`.
    #[must_use]
    pub fn fail(mut self, op: MockOperation, count: u32) -> Self {
        self.failures[op.index()] = count;
        self
    }

    /// Fail every call of `op`.
    #[must_use]
    pub fn fail_always(self, op: MockOperation) -> Self {
        self.fail(op, u32::MAX)
    }

    /// Kind of error injected failures produce.
    #[must_use]
    pub fn failure_kind(mut self, kind: FailureKind) -> Self {
        self.failure_kind = kind;
        self
    }

    /// Make injected failures look like the decoder rejected a payload.
    #[must_use]
    pub fn parse_failure(mut self, err: ParseError) -> Self {
        self.parse_failure = Some(err);
        self
    }

    /// Build the mock backend.
    pub fn build(self) -> MockBackend {
        MockBackend {
            devices: RwLock::new(self.devices),
            discoverable: self.discoverable,
            failure_kind: self.failure_kind,
            parse_failure: self.parse_failure,
            remaining_failures: self.failures.map(AtomicU32::new),
            calls: MockOperation::ALL.map(|_| AtomicU32::new(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddress {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_mock_backend_defaults() {
        let backend = MockBackend::builder().build();
        assert!(backend.discover().await.unwrap().is_empty());
        for op in MockOperation::ALL {
            assert_eq!(backend.remaining_failures(op), 0);
        }
    }

    #[tokio::test]
    async fn test_mock_backend_reads() {
        let a = mac("aa:bb:cc:dd:ee:01");
        let backend = MockBackend::builder()
            .device(a, MockSensor::wave_plus("1"))
            .build();

        assert_eq!(backend.discover().await.unwrap(), vec![a]);

        let info = backend.get_info(&[a]).await.unwrap();
        assert_eq!(info[&a].serial_nr, "1");

        let sensors = backend.get_sensors(&[a]).await.unwrap();
        assert_eq!(sensors[&a].len(), 2);

        let data = backend.get_sensor_data(&sensors).await.unwrap();
        assert_eq!(data[&a]["co2"], SensorValue::Number(612.0));
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let backend = MockBackend::builder().build();
        let err = backend
            .get_info(&[mac("aa:bb:cc:dd:ee:01")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_transient_failures() {
        let a = mac("aa:bb:cc:dd:ee:01");
        let backend = MockBackend::builder()
            .device(a, MockSensor::wave_plus("1"))
            .fail(MockOperation::GetSensors, 2)
            .build();

        assert!(backend.get_sensors(&[a]).await.is_err());
        assert!(backend.get_sensors(&[a]).await.is_err());
        assert!(backend.get_sensors(&[a]).await.is_ok());
        assert_eq!(backend.call_count(MockOperation::GetSensors), 3);
        assert_eq!(backend.call_count(MockOperation::GetInfo), 0);
    }

    #[tokio::test]
    async fn test_fail_always() {
        let backend = MockBackend::builder()
            .fail_always(MockOperation::Discover)
            .failure_kind(FailureKind::UnreachableDevice)
            .build();

        for _ in 0..5 {
            let err = backend.discover().await.unwrap_err();
            assert_eq!(err.kind(), FailureKind::UnreachableDevice);
        }
        assert_eq!(backend.remaining_failures(MockOperation::Discover), u32::MAX);
    }

    #[tokio::test]
    async fn test_parse_failure_injected() {
        let a = mac("aa:bb:cc:dd:ee:01");
        let backend = MockBackend::builder()
            .device(a, MockSensor::wave_plus("1"))
            .fail(MockOperation::GetSensorData, 1)
            .parse_failure(ParseError::InsufficientBytes {
                expected: 20,
                actual: 3,
            })
            .build();
        let sensors = backend.get_sensors(&[a]).await.unwrap();

        let err = backend.get_sensor_data(&sensors).await.unwrap_err();
        assert!(matches!(err, Error::InvalidReadingFormat { actual: 3, .. }));
        assert!(backend.get_sensor_data(&sensors).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_value() {
        let a = mac("aa:bb:cc:dd:ee:01");
        let backend = MockBackend::builder()
            .device(a, MockSensor::wave_plus("1"))
            .build();
        backend.set_value(a, "co2", 1500.0).await;

        let sensors = backend.get_sensors(&[a]).await.unwrap();
        let data = backend.get_sensor_data(&sensors).await.unwrap();
        assert_eq!(data[&a]["co2"], SensorValue::Number(1500.0));
    }

    #[tokio::test]
    async fn test_hidden_device_not_discovered() {
        let a = mac("aa:bb:cc:dd:ee:01");
        let backend = MockBackend::builder()
            .hidden_device(a, MockSensor::default())
            .build();
        assert!(backend.discover().await.unwrap().is_empty());
        assert!(backend.get_info(&[a]).await.is_ok());
    }
}
