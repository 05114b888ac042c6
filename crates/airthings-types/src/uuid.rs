//! Bluetooth UUIDs and identifiers for Airthings devices.
//!
//! This module contains the GATT characteristic UUIDs needed to read
//! Airthings Wave, Wave Plus, Wave 2 and Wave Mini sensors over Bluetooth
//! Low Energy.

use uuid::{Uuid, uuid};

/// Airthings company identifier in BLE manufacturer-specific advertisement data.
pub const MANUFACTURER_ID: u16 = 0x0334;

// --- Standard BLE Characteristic UUIDs ---

/// Device Name characteristic (GAP).
pub const DEVICE_NAME: Uuid = uuid!("00002a00-0000-1000-8000-00805f9b34fb");

/// Model Number String characteristic.
pub const MODEL_NUMBER: Uuid = uuid!("00002a24-0000-1000-8000-00805f9b34fb");

/// Serial Number String characteristic.
pub const SERIAL_NUMBER: Uuid = uuid!("00002a25-0000-1000-8000-00805f9b34fb");

/// Manufacturer Name String characteristic.
pub const MANUFACTURER_NAME: Uuid = uuid!("00002a29-0000-1000-8000-00805f9b34fb");

/// Date Time characteristic (first generation Wave).
pub const DATETIME: Uuid = uuid!("00002a08-0000-1000-8000-00805f9b34fb");

/// Temperature characteristic (first generation Wave).
pub const TEMPERATURE: Uuid = uuid!("00002a6e-0000-1000-8000-00805f9b34fb");

/// Humidity characteristic (first generation Wave).
pub const HUMIDITY: Uuid = uuid!("00002a6f-0000-1000-8000-00805f9b34fb");

// --- Airthings Characteristic UUIDs ---

/// Radon short term (24 hour) average.
pub const RADON_1DAY_AVG: Uuid = uuid!("b42e01aa-ade7-11e4-89d3-123b93f75cba");

/// Radon long term average.
pub const RADON_LONGTERM_AVG: Uuid = uuid!("b42e0a4c-ade7-11e4-89d3-123b93f75cba");

/// Illuminance and accelerometer (first generation Wave).
pub const ILLUMINANCE_ACCELEROMETER: Uuid = uuid!("b42e1348-ade7-11e4-89d3-123b93f75cba");

/// Combined current values of the Wave Plus.
pub const WAVE_PLUS_DATA: Uuid = uuid!("b42e2a68-ade7-11e4-89d3-123b93f75cba");

/// Combined current values of the Wave 2.
pub const WAVE_2_DATA: Uuid = uuid!("b42e4dcc-ade7-11e4-89d3-123b93f75cba");

/// Combined current values of the Wave Mini.
pub const WAVE_MINI_DATA: Uuid = uuid!("b42e3b98-ade7-11e4-89d3-123b93f75cba");

/// Access control point used to request battery and illuminance data.
pub const COMMAND: Uuid = uuid!("b42e2d06-ade7-11e4-89d3-123b93f75cba");

/// Characteristics that carry sensor values, in the order they are read.
pub const SENSOR_CHARACTERISTICS: [Uuid; 10] = [
    DATETIME,
    TEMPERATURE,
    HUMIDITY,
    RADON_1DAY_AVG,
    RADON_LONGTERM_AVG,
    ILLUMINANCE_ACCELEROMETER,
    WAVE_PLUS_DATA,
    WAVE_2_DATA,
    WAVE_MINI_DATA,
    COMMAND,
];

/// Returns `true` if `uuid` is one of the sensor characteristics.
pub fn is_sensor_characteristic(uuid: &Uuid) -> bool {
    SENSOR_CHARACTERISTICS.contains(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_characteristics_are_unique() {
        for (i, a) in SENSOR_CHARACTERISTICS.iter().enumerate() {
            for b in &SENSOR_CHARACTERISTICS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_device_info_characteristics_not_sensors() {
        assert!(!is_sensor_characteristic(&MANUFACTURER_NAME));
        assert!(!is_sensor_characteristic(&SERIAL_NUMBER));
        assert!(is_sensor_characteristic(&WAVE_PLUS_DATA));
        assert!(is_sensor_characteristic(&COMMAND));
    }
}
