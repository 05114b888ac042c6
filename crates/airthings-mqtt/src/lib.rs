//! Bridge from Airthings BLE sensors to MQTT.
//!
//! This crate provides a daemon that:
//! - Polls configured Airthings devices on a fixed interval
//! - Publishes each reading to `airthings/<mac>/<field>`
//! - Announces the sensors to Home Assistant through MQTT discovery, once
//!   per process
//!
//! # Configuration
//!
//! Options are flat keys, read from `./options.json` (the Home Assistant
//! add-on file) or `~/.config/airthings-mqtt/config.toml`:
//!
//! ```toml
//! mqtt_host = "localhost"
//! mqtt_port = 1883
//! mqtt_retain = false
//! refresh_interval = 150
//!
//! [[devices]]
//! mac = "aa:bb:cc:dd:ee:ff"
//! name = "Basement"
//! ```
//!
//! Command-line flags override the file.

pub mod bridge;
pub mod config;
pub mod discovery;
pub mod mqtt;
pub mod sensors;
pub mod suggest;
pub mod values;

pub use bridge::{Bridge, BridgeError, CycleReport};
pub use config::{CliOverrides, Config, ConfigError, DeviceConfig, ValidationError};
pub use mqtt::{BrokerOptions, MessageSink, MqttMessage, PublishError, RecordingSink, RumqttSink};
