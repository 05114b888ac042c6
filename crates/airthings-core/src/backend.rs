//! The btleplug-backed [`SensorBackend`].
//!
//! Devices are connected one at a time for each call and disconnected again
//! afterwards; Airthings sensors only accept a single central and keeping
//! the link up between polls drains their batteries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use btleplug::platform::{Adapter, Peripheral};
use time::OffsetDateTime;
use tracing::{debug, info};

use airthings_types::{DATE_TIME_FIELD, DeviceInfo, MacAddress, SensorData, SensorValue};

use crate::device::{ConnectionConfig, Device};
use crate::error::Result;
use crate::scan::{ScanOptions, find_peripherals, get_adapter, scan_with_adapter};
use crate::traits::{SensorBackend, SensorMap};

/// Reads Airthings Wave family sensors through the first Bluetooth adapter.
pub struct WaveBackend {
    adapter: Adapter,
    scan: ScanOptions,
    connection: ConnectionConfig,
}

impl std::fmt::Debug for WaveBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveBackend")
            .field("scan", &self.scan)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl WaveBackend {
    /// Open the first Bluetooth adapter.
    pub async fn new(scan: ScanOptions) -> Result<Self> {
        Ok(Self::with_adapter(get_adapter().await?, scan))
    }

    /// Use an already opened adapter.
    pub fn with_adapter(adapter: Adapter, scan: ScanOptions) -> Self {
        Self {
            adapter,
            scan,
            connection: ConnectionConfig::default(),
        }
    }

    /// Replace the connection timeouts.
    #[must_use]
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }

    async fn connect(&self, mac: MacAddress, peripheral: Peripheral) -> Result<Device> {
        Device::connect(peripheral, mac, self.connection.clone()).await
    }
}

/// Disconnect, keeping the operation's own result.
async fn finish<T>(device: Device, result: Result<T>) -> Result<T> {
    if let Err(e) = device.disconnect().await {
        debug!("Disconnect from {} failed: {}", device.mac(), e);
    }
    result
}

/// Local wall-clock time as `YYYY-MM-DDTHH:MM:SS`.
fn now_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

#[async_trait]
impl SensorBackend for WaveBackend {
    async fn discover(&self) -> Result<Vec<MacAddress>> {
        let found = scan_with_adapter(&self.adapter, &self.scan).await?;
        Ok(found.into_iter().map(|d| d.mac).collect())
    }

    async fn get_info(&self, macs: &[MacAddress]) -> Result<BTreeMap<MacAddress, DeviceInfo>> {
        let peripherals = find_peripherals(&self.adapter, macs, &self.scan).await?;
        let mut infos = BTreeMap::new();
        for (mac, peripheral) in peripherals {
            let device = self.connect(mac, peripheral).await?;
            let result = device.read_device_info().await;
            let info = finish(device, result).await?;
            info!("{}: {}", mac, info);
            infos.insert(mac, info);
        }
        Ok(infos)
    }

    async fn get_sensors(&self, macs: &[MacAddress]) -> Result<SensorMap> {
        let peripherals = find_peripherals(&self.adapter, macs, &self.scan).await?;
        let mut sensors = BTreeMap::new();
        for (mac, peripheral) in peripherals {
            let device = self.connect(mac, peripheral).await?;
            let found = device.sensors();
            let found = finish(device, Ok(found)).await?;
            debug!("{}: {} sensor characteristic(s)", mac, found.len());
            sensors.insert(mac, found);
        }
        Ok(sensors)
    }

    async fn get_sensor_data(
        &self,
        sensors: &SensorMap,
    ) -> Result<BTreeMap<MacAddress, SensorData>> {
        let macs: Vec<MacAddress> = sensors.keys().copied().collect();
        let peripherals = find_peripherals(&self.adapter, &macs, &self.scan).await?;
        let mut readings = BTreeMap::new();
        for (mac, peripheral) in peripherals {
            let Some(descriptors) = sensors.get(&mac) else {
                continue;
            };
            let device = self.connect(mac, peripheral).await?;
            let result = device.read_sensors(descriptors).await;
            let mut data = finish(device, result).await?;
            if !data.is_empty() {
                data.entry(DATE_TIME_FIELD.to_string())
                    .or_insert_with(|| SensorValue::Text(now_timestamp()));
            }
            readings.insert(mac, data);
        }
        Ok(readings)
    }
}
