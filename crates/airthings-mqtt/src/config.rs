//! Bridge configuration.
//!
//! Options are flat keys so the same file works as a Home Assistant add-on
//! `options.json` or as a TOML file. The format is chosen by extension:
//! `.toml` is TOML, anything else is JSON.
//!
//! Precedence is defaults, then the config file, then command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use airthings_core::{DEFAULT_DEVICE_NAME, MacAddress, RetryConfig};

/// Config file looked for in the working directory when `--config` is not given.
pub const LOCAL_OPTIONS_FILE: &str = "options.json";

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broker host name or address.
    pub mqtt_host: String,
    /// Broker port.
    pub mqtt_port: u16,
    /// Broker user name. Only used when the password is set too.
    pub mqtt_username: String,
    /// Broker password. Only used when the user name is set too.
    pub mqtt_password: String,
    /// MQTT client id.
    pub mqtt_client_id: String,
    /// Retain value messages.
    #[serde(deserialize_with = "lenient_bool")]
    pub mqtt_retain: bool,
    /// Send Home Assistant discovery messages on the first cycle.
    #[serde(deserialize_with = "lenient_bool")]
    pub mqtt_discovery: bool,
    /// Seconds between polls.
    pub refresh_interval: u64,
    /// Attempts per device call.
    pub retry_count: u32,
    /// Seconds between attempts.
    pub retry_wait: u64,
    /// Seconds a discovery scan runs.
    pub scan_timeout: u64,
    /// Exit instead of waiting for the next cycle when a poll fails.
    #[serde(deserialize_with = "lenient_bool")]
    pub exit_on_read_failure: bool,
    /// CRITICAL, ERROR, WARNING, INFO or DEBUG (tracing names work too).
    pub log_level: String,
    /// Devices to poll. Empty means "scan and print what was found".
    pub devices: Vec<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_host: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_username: String::new(),
            mqtt_password: String::new(),
            mqtt_client_id: "airthings-mqtt".to_string(),
            mqtt_retain: false,
            mqtt_discovery: true,
            refresh_interval: 150,
            retry_count: 10,
            retry_wait: 3,
            scan_timeout: 10,
            exit_on_read_failure: false,
            log_level: "INFO".to_string(),
            devices: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        if is_toml(path) {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    /// Find the config file to use.
    ///
    /// An explicit path must exist. Otherwise `./options.json` is tried,
    /// then the per-user config file. `None` means run on defaults.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from(LOCAL_OPTIONS_FILE);
        if local.exists() {
            return Ok(Some(local));
        }

        let user = default_config_path();
        if user.exists() {
            return Ok(Some(user));
        }
        Ok(None)
    }

    /// Locate, load, apply overrides and validate.
    pub fn resolve(explicit: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match Self::locate(explicit)? {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, in the format its extension selects.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(ConfigError::Serialize)?
        } else {
            serde_json::to_string_pretty(self).map_err(ConfigError::SerializeJson)?
        };

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(host) = &overrides.mqtt_host {
            self.mqtt_host = host.clone();
        }
        if let Some(port) = overrides.mqtt_port {
            self.mqtt_port = port;
        }
        if let Some(username) = &overrides.mqtt_username {
            self.mqtt_username = username.clone();
        }
        if let Some(password) = &overrides.mqtt_password {
            self.mqtt_password = password.clone();
        }
        if let Some(retain) = overrides.mqtt_retain {
            self.mqtt_retain = retain;
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
    }

    /// Validate the configuration and return any errors.
    ///
    /// # Example
    ///
    /// ```
    /// use airthings_mqtt::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: message.to_string(),
                });
            }
        };

        check(!self.mqtt_host.trim().is_empty(), "mqtt_host", "broker host cannot be empty");
        check(self.mqtt_port != 0, "mqtt_port", "port cannot be 0");
        check(
            !self.mqtt_client_id.is_empty() && !self.mqtt_client_id.starts_with(' '),
            "mqtt_client_id",
            "client id cannot be empty or start with a space",
        );
        check(self.refresh_interval > 0, "refresh_interval", "must be at least 1 second");
        check(self.retry_count > 0, "retry_count", "must be at least 1");
        check(self.scan_timeout > 0, "scan_timeout", "must be at least 1 second");
        if level_filter(&self.log_level).is_none() {
            errors.push(ValidationError {
                field: "log_level".to_string(),
                message: format!(
                    "unknown log level '{}' (expected CRITICAL, ERROR, WARNING, INFO or DEBUG)",
                    self.log_level
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// The configured devices with a well-formed MAC, by address.
    ///
    /// Malformed or missing addresses are logged and skipped. A missing or
    /// empty name becomes [`DEFAULT_DEVICE_NAME`]. Of duplicate addresses the
    /// last wins.
    pub fn valid_devices(&self) -> BTreeMap<MacAddress, String> {
        let mut devices = BTreeMap::new();
        for device in &self.devices {
            let Some(text) = device.mac.as_deref() else {
                warn!("No mac address provided for device {}", device.display_name());
                continue;
            };
            match text.parse::<MacAddress>() {
                Ok(mac) => {
                    devices.insert(mac, device.display_name().to_string());
                }
                Err(_) => warn!("Invalid mac address provided: {}", text),
            }
        }
        devices
    }

    /// Retry policy for device calls.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.retry_count, Duration::from_secs(self.retry_wait))
    }

    /// Time between polls.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Duration of a discovery scan.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout)
    }

    /// `tracing` filter directive for the configured log level.
    pub fn log_filter(&self) -> &'static str {
        level_filter(&self.log_level).unwrap_or("info")
    }
}

/// Configuration for a device to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// MAC address in any accepted form. `None` when the entry has no `mac`
    /// or its value is not a string.
    #[serde(
        default,
        deserialize_with = "lenient_mac",
        skip_serializing_if = "Option::is_none"
    )]
    pub mac: Option<String>,
    /// Name used as prefix for the Home Assistant entity names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DeviceConfig {
    /// Entry for `mac` with an optional name.
    pub fn new(mac: impl Into<String>, name: Option<String>) -> Self {
        Self {
            mac: Some(mac.into()),
            name,
        }
    }

    /// The name, or [`DEFAULT_DEVICE_NAME`] when unset or empty.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_DEVICE_NAME,
        }
    }
}

/// Values given on the command line. `None` keeps the file's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub mqtt_host: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_retain: Option<bool>,
    pub log_level: Option<String>,
}

/// Map a log level name to a `tracing` filter directive.
fn level_filter(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => Some("error"),
        "WARNING" | "WARN" => Some("warn"),
        "INFO" => Some("info"),
        "DEBUG" => Some("debug"),
        "TRACE" => Some("trace"),
        _ => None,
    }
}

/// Parse `true`/`false` in any letter case.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("expected true or false, got '{}'", s)),
    }
}

/// Accept a boolean or its quoted string form.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => parse_bool(&s).map_err(serde::de::Error::custom),
    }
}

/// Keep a string `mac` and drop anything else, so one bad entry does not
/// fail the whole file.
fn lenient_mac<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MacField {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match MacField::deserialize(deserializer)? {
        MacField::Text(mac) => Some(mac),
        MacField::Other(_) => None,
    })
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    ParseJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeJson(serde_json::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The option name (e.g., `mqtt_port`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default per-user configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airthings-mqtt")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(mac: &str, name: Option<&str>) -> DeviceConfig {
        DeviceConfig::new(mac, name.map(str::to_string))
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.mqtt_host, "localhost");
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.mqtt_client_id, "airthings-mqtt");
        assert!(!config.mqtt_retain);
        assert!(config.mqtt_discovery);
        assert_eq!(config.refresh_interval, 150);
        assert_eq!(config.retry_count, 10);
        assert_eq!(config.retry_wait, 3);
        assert_eq!(config.scan_timeout, 10);
        assert!(!config.exit_on_read_failure);
        assert_eq!(config.log_level, "INFO");
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_options_json() {
        let json = r#"{
            "mqtt_host": "core-mosquitto",
            "mqtt_port": 1884,
            "mqtt_username": "ha",
            "mqtt_password": "secret",
            "mqtt_retain": "True",
            "mqtt_discovery": "false",
            "refresh_interval": 300,
            "retry_count": 5,
            "retry_wait": 2,
            "log_level": "DEBUG",
            "devices": [
                {"mac": "AA:BB:CC:DD:EE:FF", "name": "Basement"},
                {"mac": "112233445566"}
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.mqtt_host, "core-mosquitto");
        assert_eq!(config.mqtt_port, 1884);
        assert!(config.mqtt_retain);
        assert!(!config.mqtt_discovery);
        assert_eq!(config.refresh_interval, 300);
        assert_eq!(config.retry_count, 5);
        assert_eq!(config.scan_timeout, 10);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[1].name, None);
    }

    #[test]
    fn test_bool_options_accept_booleans() {
        let config: Config = serde_json::from_str(r#"{"mqtt_retain": true}"#).unwrap();
        assert!(config.mqtt_retain);

        let result: Result<Config, _> = serde_json::from_str(r#"{"mqtt_retain": "maybe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            mqtt_host = "broker.lan"
            mqtt_retain = true
            refresh_interval = 60

            [[devices]]
            mac = "aa:bb:cc:dd:ee:ff"
            name = "Living Room"

            [[devices]]
            mac = "11-22-33-44-55-66"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt_host, "broker.lan");
        assert!(config.mqtt_retain);
        assert_eq!(config.refresh_interval, 60);
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].name.as_deref(), Some("Living Room"));
    }

    #[test]
    fn test_config_save_and_load_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            mqtt_host: "10.0.0.2".to_string(),
            devices: vec![device("aa:bb:cc:dd:ee:ff", Some("Office"))],
            ..Config::default()
        };

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_save_and_load_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("options.json");

        let config = Config {
            mqtt_retain: true,
            devices: vec![device("aa:bb:cc:dd:ee:ff", None)],
            ..Config::default()
        };

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();

        let toml_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&toml_path, "this is not valid { toml").unwrap();
        assert!(matches!(
            Config::load(&toml_path),
            Err(ConfigError::Parse { .. })
        ));

        let json_path = temp_dir.path().join("options.json");
        std::fs::write(&json_path, "{ not json").unwrap();
        assert!(matches!(
            Config::load(&json_path),
            Err(ConfigError::ParseJson { .. })
        ));
    }

    #[test]
    fn test_locate_explicit_must_exist() {
        let result = Config::locate(Some(Path::new("/nonexistent/options.json")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("options.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(Config::locate(Some(&path)).unwrap(), Some(path));
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"mqtt_host": "from-file", "mqtt_port": 1884, "mqtt_retain": true}"#,
        )
        .unwrap();

        let overrides = CliOverrides {
            mqtt_host: Some("from-cli".to_string()),
            mqtt_retain: Some(false),
            ..CliOverrides::default()
        };
        let config = Config::resolve(Some(&path), &overrides).unwrap();

        assert_eq!(config.mqtt_host, "from-cli");
        assert_eq!(config.mqtt_port, 1884);
        assert!(!config.mqtt_retain);
    }

    #[test]
    fn test_resolve_rejects_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("options.json");
        std::fs::write(&path, r#"{"retry_count": 0}"#).unwrap();

        let result = Config::resolve(Some(&path), &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("airthings-mqtt/config.toml"));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Read {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let display = format!("{}", error);
        assert!(display.contains("/test/path"));
        assert!(display.contains("not found"));
    }

    // ==========================================================================
    // Validation tests
    // ==========================================================================

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let config = Config {
            mqtt_host: " ".to_string(),
            mqtt_port: 0,
            refresh_interval: 0,
            retry_count: 0,
            log_level: "VERBOSE".to_string(),
            ..Config::default()
        };

        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "mqtt_host",
                "mqtt_port",
                "refresh_interval",
                "retry_count",
                "log_level"
            ]
        );
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let config = Config {
            mqtt_client_id: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_levels() {
        for (level, filter) in [
            ("CRITICAL", "error"),
            ("ERROR", "error"),
            ("WARNING", "warn"),
            ("warn", "warn"),
            ("INFO", "info"),
            ("debug", "debug"),
            ("TRACE", "trace"),
        ] {
            let config = Config {
                log_level: level.to_string(),
                ..Config::default()
            };
            assert!(config.validate().is_ok(), "{level}");
            assert_eq!(config.log_filter(), filter);
        }
    }

    #[test]
    fn test_valid_devices() {
        let config = Config {
            devices: vec![
                device("AA:BB:CC:DD:EE:FF", Some("Basement")),
                device("not-a-mac", Some("Broken")),
                device("112233445566", None),
                device("11-22-33-44-55-77", Some("  ")),
                device("aa:bb-cc:dd:ee:ff", None),
            ],
            ..Config::default()
        };

        let devices = config.valid_devices();
        assert_eq!(devices.len(), 3);
        let names: Vec<&str> = devices.values().map(String::as_str).collect();
        assert_eq!(names, ["Airthings", "Airthings", "Basement"]);
        assert_eq!(
            devices[&"aa:bb:cc:dd:ee:ff".parse().unwrap()],
            "Basement".to_string()
        );
    }

    #[test]
    fn test_device_without_string_mac_is_skipped() {
        let json = r#"{
            "devices": [
                {"name": "NoMac"},
                {"mac": 1234, "name": "Numeric"},
                {"mac": null},
                {"mac": "AA:BB:CC:DD:EE:FF", "name": "Basement"}
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.devices.len(), 4);
        assert_eq!(config.devices[0].mac, None);
        assert_eq!(config.devices[1].mac, None);

        let devices = config.valid_devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(
            devices[&"aa:bb:cc:dd:ee:ff".parse().unwrap()],
            "Basement".to_string()
        );
    }

    #[test]
    fn test_load_keeps_valid_devices_next_to_broken_ones() {
        let temp_dir = tempfile::tempdir().unwrap();

        let json_path = temp_dir.path().join("options.json");
        std::fs::write(
            &json_path,
            r#"{"devices": [{"mac": 1234}, {"mac": "11:22:33:44:55:66"}]}"#,
        )
        .unwrap();
        let config = Config::resolve(Some(&json_path), &CliOverrides::default()).unwrap();
        assert_eq!(config.valid_devices().len(), 1);

        let toml_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &toml_path,
            "[[devices]]\nname = \"NoMac\"\n\n[[devices]]\nmac = 42\n\n[[devices]]\nmac = \"11:22:33:44:55:66\"\n",
        )
        .unwrap();
        let config = Config::load(&toml_path).unwrap();
        assert_eq!(config.devices.len(), 3);
        assert_eq!(config.valid_devices().len(), 1);
    }

    #[test]
    fn test_retry_from_config() {
        let config = Config {
            retry_count: 4,
            retry_wait: 7,
            ..Config::default()
        };
        let retry = config.retry();
        assert_eq!(retry.attempts, 4);
        assert_eq!(retry.wait, Duration::from_secs(7));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError {
            field: "mqtt_port".to_string(),
            message: "port cannot be 0".to_string(),
        };
        assert_eq!(error.to_string(), "mqtt_port: port cannot be 0");
    }
}
