//! Platform-agnostic types for Airthings environmental sensors.
//!
//! This crate provides shared types used by the BLE layer (airthings-core)
//! and the MQTT bridge (airthings-mqtt).
//!
//! # Features
//!
//! - Validated [`MacAddress`] with the normalization used in MQTT topics
//! - Device information and sensor value types
//! - UUID constants for Airthings BLE characteristics
//! - Pure decoders for raw characteristic payloads
//!
//! # Example
//!
//! ```
//! use airthings_types::{Decoder, MacAddress, SensorValue};
//! use airthings_types::uuid::WAVE_PLUS_DATA;
//!
//! let mac: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
//! assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
//!
//! let decoder = Decoder::for_characteristic(&WAVE_PLUS_DATA).unwrap();
//! let raw = [1u8, 90, 0, 0, 55, 0, 40, 0, 0x59, 0x08, 0xa8, 0xc5, 0x64, 0x02, 0x55, 0, 0, 0, 0, 0];
//! let values = decoder.decode(&raw).unwrap();
//! assert_eq!(values["co2"], SensorValue::Number(612.0));
//! ```

pub mod decode;
pub mod error;
pub mod mac;
pub mod types;
pub mod uuid;

pub use decode::Decoder;
pub use error::{ParseError, ParseResult};
pub use mac::MacAddress;
pub use types::{DATE_TIME_FIELD, DeviceInfo, SensorData, SensorDescriptor, SensorValue};
pub use uuid as ble;
