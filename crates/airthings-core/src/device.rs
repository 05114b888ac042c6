//! Airthings device connection and communication.
//!
//! This module provides the interface for connecting to a single Airthings
//! sensor over Bluetooth Low Energy, listing its sensor characteristics and
//! reading them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::StreamExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use airthings_types::ble::{
    DEVICE_NAME, MANUFACTURER_NAME, MODEL_NUMBER, SENSOR_CHARACTERISTICS, SERIAL_NUMBER,
};
use airthings_types::decode::COMMAND_BATTERY;
use airthings_types::{Decoder, DeviceInfo, MacAddress, SensorData, SensorDescriptor};

use crate::error::{Error, Result};

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE connection operations.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to wait for the answer to a command write.
const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for BLE connection timeouts.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use airthings_core::device::ConnectionConfig;
///
/// // Sensor in the basement, behind two concrete walls
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(30))
///     .read_timeout(Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the connection.
    pub connection_timeout: Duration,
    /// Timeout for a characteristic read.
    pub read_timeout: Duration,
    /// Timeout for a characteristic write.
    pub write_timeout: Duration,
    /// Timeout for GATT service discovery.
    pub discovery_timeout: Duration,
    /// Timeout for the notification answering a command write.
    pub notification_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the command notification timeout.
    #[must_use]
    pub fn notification_timeout(mut self, timeout: Duration) -> Self {
        self.notification_timeout = timeout;
        self
    }
}

/// A connected Airthings device.
///
/// This struct does not implement `Clone`: it represents one live BLE
/// connection.
///
/// # Cleanup
///
/// Call [`Device::disconnect`] before dropping the device. A device dropped
/// while still connected logs a warning and disconnects in the background.
pub struct Device {
    peripheral: Peripheral,
    mac: MacAddress,
    /// Characteristics by UUID, built once after service discovery.
    characteristics: HashMap<Uuid, Characteristic>,
    disconnected: AtomicBool,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("mac", &self.mac)
            .field("characteristics", &self.characteristics.len())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Connect to a discovered peripheral and discover its services.
    #[tracing::instrument(level = "debug", skip_all, fields(mac = %mac))]
    pub async fn connect(
        peripheral: Peripheral,
        mac: MacAddress,
        config: ConnectionConfig,
    ) -> Result<Self> {
        if !peripheral.is_connected().await? {
            debug!("Connecting to device...");
            timeout(config.connection_timeout, peripheral.connect())
                .await
                .map_err(|_| Error::timeout("connect to device", config.connection_timeout))??;
        }

        let discovery = async {
            timeout(config.discovery_timeout, peripheral.discover_services())
                .await
                .map_err(|_| Error::timeout("discover services", config.discovery_timeout))??;
            Ok::<_, Error>(())
        };
        disconnect_on_error(discovery, async {
            peripheral.disconnect().await.map_err(Error::from)
        })
        .await?;

        let mut characteristics = HashMap::new();
        for service in peripheral.services() {
            debug!("  Service: {}", service.uuid);
            for char in service.characteristics {
                debug!("    Characteristic: {}", char.uuid);
                characteristics.insert(char.uuid, char);
            }
        }
        info!("Connected to {} ({} characteristics)", mac, characteristics.len());

        Ok(Self {
            peripheral,
            mac,
            characteristics,
            disconnected: AtomicBool::new(false),
            config,
        })
    }

    /// The device address.
    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::SeqCst);
        debug!("Disconnecting from {}", self.mac);
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// The sensor characteristics this device exposes, in reading order.
    pub fn sensors(&self) -> Vec<SensorDescriptor> {
        SENSOR_CHARACTERISTICS
            .iter()
            .filter_map(|uuid| self.characteristics.get(uuid))
            .map(|char| SensorDescriptor {
                uuid: char.uuid,
                service: char.service_uuid,
            })
            .collect()
    }

    fn find_characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics.get(&uuid).ok_or_else(|| {
            Error::characteristic_not_found(uuid.to_string(), self.peripheral.services().len())
        })
    }

    /// Read a characteristic value by UUID.
    pub async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let characteristic = self.find_characteristic(uuid)?;
        let data = timeout(self.config.read_timeout, self.peripheral.read(characteristic))
            .await
            .map_err(|_| {
                Error::timeout(format!("read characteristic {}", uuid), self.config.read_timeout)
            })??;
        Ok(data)
    }

    /// Write a value to a characteristic.
    pub async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<()> {
        let characteristic = self.find_characteristic(uuid)?;
        timeout(
            self.config.write_timeout,
            self.peripheral
                .write(characteristic, data, WriteType::WithResponse),
        )
        .await
        .map_err(|_| {
            Error::timeout(format!("write characteristic {}", uuid), self.config.write_timeout)
        })??;
        Ok(())
    }

    /// Write a command to a control point and wait for the notification that
    /// answers it.
    pub async fn request(&self, uuid: Uuid, command: &[u8]) -> Result<Vec<u8>> {
        let characteristic = self.find_characteristic(uuid)?;
        self.peripheral.subscribe(characteristic).await?;
        let mut notifications = self.peripheral.notifications().await?;

        let answer = async {
            self.write_characteristic(uuid, command).await?;
            timeout(self.config.notification_timeout, async {
                while let Some(notification) = notifications.next().await {
                    if notification.uuid == uuid {
                        return Some(notification.value);
                    }
                }
                None
            })
            .await
            .map_err(|_| {
                Error::timeout(
                    format!("notification on {}", uuid),
                    self.config.notification_timeout,
                )
            })?
            .ok_or(Error::NotConnected)
        }
        .await;

        if let Err(e) = self.peripheral.unsubscribe(characteristic).await {
            debug!("Failed to unsubscribe from {}: {}", uuid, e);
        }
        answer
    }

    /// Read manufacturer, serial number, model and name.
    ///
    /// Characteristics the device does not have are left empty; a failed
    /// read of one it does have fails the call.
    #[tracing::instrument(level = "debug", skip(self), fields(mac = %self.mac))]
    pub async fn read_device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            manufacturer: self.read_optional_string(MANUFACTURER_NAME).await?,
            serial_nr: self.read_optional_string(SERIAL_NUMBER).await?,
            model_nr: self.read_optional_string(MODEL_NUMBER).await?,
            device_name: self.read_optional_string(DEVICE_NAME).await?,
        })
    }

    async fn read_optional_string(&self, uuid: Uuid) -> Result<String> {
        match self.read_characteristic(uuid).await {
            Ok(data) => Ok(String::from_utf8_lossy(&data)
                .trim_end_matches('\0')
                .to_string()),
            Err(Error::CharacteristicNotFound { .. }) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Read and decode one sensor characteristic.
    pub async fn read_sensor(&self, sensor: &SensorDescriptor) -> Result<SensorData> {
        let decoder = Decoder::for_characteristic(&sensor.uuid).ok_or_else(|| {
            Error::InvalidData(format!("no decoder for characteristic {}", sensor.uuid))
        })?;

        let raw = if decoder.is_command() {
            self.request(sensor.uuid, &[COMMAND_BATTERY]).await?
        } else {
            self.read_characteristic(sensor.uuid).await?
        };
        debug!("{} {}: {:02x?}", self.mac, sensor.uuid, raw);

        Ok(decoder.decode(&raw)?)
    }

    /// Read every listed sensor and merge the results.
    pub async fn read_sensors(&self, sensors: &[SensorDescriptor]) -> Result<SensorData> {
        let mut data = SensorData::new();
        for sensor in sensors {
            data.extend(self.read_sensor(sensor).await?);
        }
        Ok(data)
    }
}

/// Await `op`, running `disconnect` if it fails. The original error is kept.
///
/// Used while connecting, before a [`Device`] exists to own the link.
async fn disconnect_on_error<T>(
    op: impl Future<Output = Result<T>>,
    disconnect: impl Future<Output = Result<()>>,
) -> Result<T> {
    let result = op.await;
    if let Err(e) = &result {
        debug!("Disconnecting after failed setup: {}", e);
        if let Err(e) = disconnect.await {
            debug!("Disconnect failed: {}", e);
        }
    }
    result
}

impl Drop for Device {
    fn drop(&mut self) {
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            warn!(
                mac = %self.mac,
                "Device dropped without calling disconnect() - disconnecting in background"
            );

            let peripheral = self.peripheral.clone();
            let mac = self.mac;
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = peripheral.disconnect().await {
                        debug!(mac = %mac, error = %e, "Background disconnect failed");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::default()
            .connection_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(15))
            .write_timeout(Duration::from_secs(12))
            .discovery_timeout(Duration::from_secs(20))
            .notification_timeout(Duration::from_secs(2));

        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(15));
        assert_eq!(config.write_timeout, Duration::from_secs(12));
        assert_eq!(config.discovery_timeout, Duration::from_secs(20));
        assert_eq!(config.notification_timeout, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_discovery_disconnects() {
        let disconnected = AtomicBool::new(false);
        let config = ConnectionConfig::default();

        let discovery = async {
            timeout(config.discovery_timeout, std::future::pending::<Result<()>>())
                .await
                .map_err(|_| Error::timeout("discover services", config.discovery_timeout))?
        };
        let err = disconnect_on_error(discovery, async {
            disconnected.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
        assert!(disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_disconnect_error_keeps_original() {
        let err = disconnect_on_error(async { Err::<(), _>(Error::NotConnected) }, async {
            Err(Error::invalid_config("already gone"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_successful_discovery_stays_connected() {
        let disconnected = AtomicBool::new(false);

        let value = disconnect_on_error(async { Ok(7) }, async {
            disconnected.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert!(!disconnected.load(Ordering::SeqCst));
    }

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.connection_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.notification_timeout, DEFAULT_NOTIFICATION_TIMEOUT);
    }
}
