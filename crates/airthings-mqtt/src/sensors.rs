//! Home Assistant metadata for the known sensor fields.

/// How a sensor field is presented in Home Assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMetadata {
    /// Field name as produced by the decoders.
    pub field: &'static str,
    /// Entity name suffix.
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub unit_of_measurement: &'static str,
    pub icon: Option<&'static str>,
    pub state_class: Option<&'static str>,
}

const MEASUREMENT: Option<&str> = Some("measurement");

/// Every field that gets a discovery entity.
pub const SENSORS: [SensorMetadata; 9] = [
    SensorMetadata {
        field: "radon_1day_avg",
        name: "Radon (1 day avg.)",
        device_class: None,
        unit_of_measurement: "Bq/m3",
        icon: Some("mdi:radioactive"),
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "radon_longterm_avg",
        name: "Radon (longterm avg.)",
        device_class: None,
        unit_of_measurement: "Bq/m3",
        icon: Some("mdi:radioactive"),
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "co2",
        name: "CO2",
        device_class: Some("carbon_dioxide"),
        unit_of_measurement: "ppm",
        icon: Some("mdi:molecule-co2"),
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "voc",
        name: "VOC",
        device_class: None,
        unit_of_measurement: "ppb",
        icon: Some("mdi:cloud"),
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "temperature",
        name: "Temperature",
        device_class: Some("temperature"),
        unit_of_measurement: "°C",
        icon: None,
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "humidity",
        name: "Humidity",
        device_class: Some("humidity"),
        unit_of_measurement: "%",
        icon: None,
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "rel_atm_pressure",
        name: "Pressure",
        device_class: Some("pressure"),
        unit_of_measurement: "mbar",
        icon: None,
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "illuminance",
        name: "Illuminance",
        device_class: Some("illuminance"),
        unit_of_measurement: "lx",
        icon: None,
        state_class: MEASUREMENT,
    },
    SensorMetadata {
        field: "battery",
        name: "Battery",
        device_class: Some("battery"),
        unit_of_measurement: "%",
        icon: None,
        state_class: MEASUREMENT,
    },
];

/// Look up the metadata of a field.
pub fn metadata(field: &str) -> Option<&'static SensorMetadata> {
    SENSORS.iter().find(|s| s.field == field)
}
