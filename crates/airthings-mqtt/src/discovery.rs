//! Home Assistant MQTT discovery messages.
//!
//! One `sensor` entity is announced per known field of every device. The
//! config is retained so Home Assistant picks it up after a restart.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use airthings_core::{
    DATE_TIME_FIELD, DEFAULT_DEVICE_NAME, MacAddress, Readings, SessionDevice,
};

use crate::mqtt::{MqttMessage, discovery_topic, value_topic};
use crate::sensors::{SensorMetadata, metadata};

/// Entity config payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,
    pub unit_of_measurement: &'static str,
    pub unique_id: String,
    pub state_topic: String,
    pub device: DiscoveryDevice,
}

/// Device block shared by every entity of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub connections: Vec<(String, String)>,
}

impl DiscoveryDevice {
    /// Build the device block from what is known about a device.
    pub fn new(mac: &MacAddress, device: Option<&SessionDevice>) -> Self {
        let info = device.and_then(|d| d.info.as_ref());
        let known = |value: &str| (!value.is_empty()).then(|| value.to_string());

        let identifiers = match info.and_then(|i| known(&i.serial_nr)) {
            Some(serial) => vec![serial],
            None => vec![mac.compact()],
        };

        Self {
            identifiers,
            manufacturer: info.and_then(|i| known(&i.manufacturer)),
            name: info.and_then(|i| known(&i.device_name)),
            model: info.and_then(|i| known(&i.model_nr)),
            connections: vec![("mac".to_string(), mac.to_string())],
        }
    }
}

impl DiscoveryConfig {
    pub fn new(
        mac: &MacAddress,
        device_name: &str,
        sensor: &SensorMetadata,
        device: DiscoveryDevice,
    ) -> Self {
        Self {
            name: format!("{} {}", device_name, sensor.name),
            device_class: sensor.device_class,
            icon: sensor.icon,
            state_class: sensor.state_class,
            unit_of_measurement: sensor.unit_of_measurement,
            unique_id: format!("{}_{}", mac, sensor.field),
            state_topic: value_topic(mac, sensor.field),
            device,
        }
    }
}

/// Build the discovery message of one field.
///
/// Returns `None` for fields without metadata.
pub fn discovery_message(
    mac: &MacAddress,
    field: &str,
    device: Option<&SessionDevice>,
) -> Option<Result<MqttMessage, serde_json::Error>> {
    let sensor = metadata(field)?;
    let name = device.map_or(DEFAULT_DEVICE_NAME, |d| d.name.as_str());
    let config = DiscoveryConfig::new(mac, name, sensor, DiscoveryDevice::new(mac, device));

    Some(
        serde_json::to_string(&config)
            .map(|payload| MqttMessage::new(discovery_topic(mac, field), payload, true)),
    )
}

/// Build the discovery messages for every field present in `readings`.
///
/// Unknown fields are skipped. A message that fails to build is logged and
/// left out.
pub fn discovery_messages(
    devices: &BTreeMap<MacAddress, SessionDevice>,
    readings: &Readings,
) -> Vec<MqttMessage> {
    let mut messages = Vec::new();
    for reading in readings.iter() {
        if reading.field == DATE_TIME_FIELD {
            continue;
        }

        match discovery_message(&reading.mac, reading.field, devices.get(&reading.mac)) {
            Some(Ok(message)) => messages.push(message),
            Some(Err(e)) => warn!(
                "Failed to build discovery config for {} {}: {}",
                reading.mac, reading.field, e
            ),
            None => debug!(
                "No discovery metadata for {} on {}, skipping",
                reading.field, reading.mac
            ),
        }
    }
    messages
}
