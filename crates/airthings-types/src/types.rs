//! Core types for Airthings sensor data.

use core::fmt;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field name of the timestamp entry that accompanies each reading.
///
/// It is carried with the data but never published as a sensor value.
pub const DATE_TIME_FIELD: &str = "date_time";

/// A single raw value produced by a sensor read.
///
/// Most characteristics decode to numbers; a few (timestamps, for example)
/// decode to text and are passed through unformatted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SensorValue {
    /// Numeric reading in the sensor's native unit.
    Number(f64),
    /// Text reading, passed through as-is.
    Text(String),
}

impl SensorValue {
    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// The text value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<String> for SensorValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for SensorValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// All values read from one device in one poll, keyed by field name.
pub type SensorData = BTreeMap<String, SensorValue>;

/// Identity information read from a device's GATT information services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    /// Manufacturer name (e.g. "Airthings AS").
    pub manufacturer: String,
    /// Serial number.
    pub serial_nr: String,
    /// Model number (e.g. "2930" for a Wave Plus).
    pub model_nr: String,
    /// Name the device reports for itself.
    pub device_name: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "manufacturer={}, serial_nr={}, model_nr={}, device_name={}",
            self.manufacturer, self.serial_nr, self.model_nr, self.device_name
        )
    }
}

/// A sensor characteristic found on a device.
///
/// btleplug addresses characteristics by UUID within a service rather than by
/// ATT handle, so the owning service takes the handle's place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorDescriptor {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// UUID of the service that owns the characteristic.
    pub service: Uuid,
}

impl fmt::Display for SensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (service {})", self.uuid, self.service)
    }
}
