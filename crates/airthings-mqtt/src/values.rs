//! Formatting of sensor values into MQTT messages.

use tracing::info;

use airthings_core::{DATE_TIME_FIELD, Readings, SensorValue};

use crate::mqtt::{MqttMessage, value_topic};

/// Battery voltage reported as 0 %.
pub const BATTERY_EMPTY_VOLTS: f64 = 2.4;

/// Voltage span from empty to full (3.2 V).
pub const BATTERY_SPAN_VOLTS: f64 = 0.8;

/// Convert a battery voltage to a percentage in `0..=100`.
///
/// ```
/// use airthings_mqtt::values::battery_percent;
///
/// assert_eq!(battery_percent(2.8), 50);
/// assert_eq!(battery_percent(2.0), 0);
/// assert_eq!(battery_percent(3.5), 100);
/// ```
pub fn battery_percent(volts: f64) -> u8 {
    let percent = ((volts - BATTERY_EMPTY_VOLTS) / BATTERY_SPAN_VOLTS * 100.0).round();
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, 100.0) as u8
}

/// Format one value for publishing.
///
/// Temperature keeps one decimal, battery becomes a percentage and every
/// other number is rounded to an integer. Text passes through.
pub fn format_value(field: &str, value: &SensorValue) -> String {
    let v = match value {
        SensorValue::Text(s) => return s.clone(),
        SensorValue::Number(v) => *v,
    };

    match field {
        "temperature" => format!("{:.1}", (v * 10.0).round() / 10.0),
        "battery" => battery_percent(v).to_string(),
        _ => (v.round() as i64).to_string(),
    }
}

/// Build the value messages of one poll.
///
/// With `clear_retained` set, each value is preceded by a retained empty
/// message on the same topic, which removes a value retained by an earlier
/// run.
pub fn value_messages(readings: &Readings, retain: bool, clear_retained: bool) -> Vec<MqttMessage> {
    let mut messages = Vec::new();
    for reading in readings.iter() {
        if reading.field == DATE_TIME_FIELD {
            continue;
        }

        let topic = value_topic(&reading.mac, reading.field);
        let payload = format_value(reading.field, reading.value);
        info!("{} = {}", topic, payload);

        if clear_retained {
            messages.push(MqttMessage::new(topic.clone(), "", true));
        }
        messages.push(MqttMessage::new(topic, payload, retain));
    }
    messages
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use airthings_core::{MacAddress, SensorData};
    use proptest::prelude::*;
    use time::OffsetDateTime;

    use super::*;

    fn readings(mac: MacAddress, values: &[(&str, SensorValue)]) -> Readings {
        let data: SensorData = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Readings {
            taken_at: OffsetDateTime::UNIX_EPOCH,
            data: BTreeMap::from([(mac, data)]),
        }
    }

    #[test]
    fn test_temperature_one_decimal() {
        assert_eq!(format_value("temperature", &21.37.into()), "21.4");
        assert_eq!(format_value("temperature", &21.0.into()), "21.0");
        assert_eq!(format_value("temperature", &(-3.04).into()), "-3.0");
    }

    #[test]
    fn test_battery_examples() {
        assert_eq!(battery_percent(2.8), 50);
        assert_eq!(battery_percent(2.9), 63);
        assert_eq!(battery_percent(2.0), 0);
        assert_eq!(battery_percent(3.5), 100);
        assert_eq!(battery_percent(f64::NAN), 0);
        assert_eq!(format_value("battery", &2.9.into()), "63");
    }

    #[test]
    fn test_other_numbers_rounded() {
        assert_eq!(format_value("co2", &612.4.into()), "612");
        assert_eq!(format_value("rel_atm_pressure", &1012.5.into()), "1013");
        assert_eq!(format_value("humidity", &45.0.into()), "45");
        assert_eq!(format_value("accelerometer", &0.2.into()), "0");
    }

    #[test]
    fn test_text_passes_through() {
        assert_eq!(format_value("co2", &"N/A".into()), "N/A");
    }

    #[test]
    fn test_value_messages() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let readings = readings(
            mac,
            &[
                ("date_time", "2024-01-01T12:00:00".into()),
                ("temperature", 21.37.into()),
                ("co2", 612.0.into()),
            ],
        );

        let messages = value_messages(&readings, true, false);
        assert_eq!(
            messages,
            [
                MqttMessage::new("airthings/aa:bb:cc:dd:ee:ff/co2", "612", true),
                MqttMessage::new("airthings/aa:bb:cc:dd:ee:ff/temperature", "21.4", true),
            ]
        );
    }

    #[test]
    fn test_clear_retained_precedes_value() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let readings = readings(mac, &[("voc", 85.0.into())]);

        let messages = value_messages(&readings, false, true);
        assert_eq!(
            messages,
            [
                MqttMessage::new("airthings/aa:bb:cc:dd:ee:ff/voc", "", true),
                MqttMessage::new("airthings/aa:bb:cc:dd:ee:ff/voc", "85", false),
            ]
        );
    }

    proptest! {
        #[test]
        fn battery_always_in_range(volts in -10.0f64..10.0) {
            prop_assert!(battery_percent(volts) <= 100);
        }

        #[test]
        fn battery_monotonic(a in 2.0f64..3.6, b in 2.0f64..3.6) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(battery_percent(lo) <= battery_percent(hi));
        }
    }
}
