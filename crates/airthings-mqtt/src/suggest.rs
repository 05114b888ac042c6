//! Suggested configuration for devices found by a scan.

use airthings_core::MacAddress;

use crate::config::{Config, DeviceConfig};

/// Placeholder name given to discovered devices.
pub const PLACEHOLDER_NAME: &str = "Insert Device Name";

/// `base` with its device list replaced by `macs`.
pub fn suggested_config(base: &Config, macs: &[MacAddress]) -> Config {
    Config {
        devices: macs
            .iter()
            .map(|mac| DeviceConfig::new(mac.to_string(), Some(PLACEHOLDER_NAME.to_string())))
            .collect(),
        ..base.clone()
    }
}

/// Render the add-on options of `config` as YAML.
///
/// Strings and booleans are quoted. Quoted booleans are the form the add-on
/// schema accepts. Devices without a `mac` are left out.
pub fn render_yaml(config: &Config) -> String {
    let mut out = String::from("devices:\n");
    for device in &config.devices {
        let Some(mac) = device.mac.as_deref() else {
            continue;
        };
        out.push_str(&format!("  - mac: {}\n", yaml_quote(mac)));
        out.push_str(&format!("    name: {}\n", yaml_quote(device.display_name())));
    }
    out.push_str(&format!("refresh_interval: {}\n", config.refresh_interval));
    out.push_str(&format!("retry_count: {}\n", config.retry_count));
    out.push_str(&format!("retry_wait: {}\n", config.retry_wait));
    out.push_str(&format!("log_level: {}\n", yaml_quote(&config.log_level)));
    out.push_str(&format!("mqtt_discovery: '{}'\n", config.mqtt_discovery));
    out.push_str(&format!("mqtt_retain: '{}'\n", config.mqtt_retain));
    out
}

/// Single-quoted YAML scalar. Inside single quotes only `'` needs escaping,
/// by doubling it.
fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render `config` as the contents of an `options.json` file.
pub fn render_json(config: &Config) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(config)
}

/// Full text shown after a scan. The broker password is left out.
pub fn suggestion(base: &Config, macs: &[MacAddress]) -> Result<String, serde_json::Error> {
    let mut config = suggested_config(base, macs);
    config.mqtt_password.clear();
    let mut out = String::new();
    out.push_str(&format!("Found {} Airthings device(s):\n", macs.len()));
    for mac in macs {
        out.push_str(&format!("  {}\n", mac));
    }
    out.push('\n');
    out.push_str("If you are running this as an add-on, use this YAML configuration:\n\n");
    out.push_str(&render_yaml(&config));
    out.push('\n');
    out.push_str("Otherwise put this in your options.json file:\n\n");
    out.push_str(&render_json(&config)?);
    out.push('\n');
    Ok(out)
}
