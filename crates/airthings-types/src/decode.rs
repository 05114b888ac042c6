//! Decoders for raw Airthings characteristic payloads.
//!
//! Each sensor characteristic has a fixed little-endian layout. A
//! [`Decoder`] turns the raw bytes of one characteristic into named
//! [`SensorValue`]s. Decoders are pure: they neither touch BLE nor read the
//! clock, which keeps them usable from both native and test code.

use bytes::Buf;
use uuid::Uuid;

use crate::error::{ParseError, ParseResult};
use crate::types::{DATE_TIME_FIELD, SensorData, SensorValue};
use crate::uuid as ble;

/// Command byte that requests the battery/illuminance status block.
pub const COMMAND_BATTERY: u8 = 0x6d;

/// Radon values above this are sentinel "not yet measured" markers.
pub const RADON_MAX: u16 = 16383;

/// Size of the Wave Plus / Wave 2 / Wave Mini combined payloads.
pub const COMBINED_PAYLOAD_BYTES: usize = 20;

/// Size of the command response body following the two header bytes.
pub const COMMAND_BODY_BYTES: usize = 28;

/// Decoder for one Airthings characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Decoder {
    /// Wave Plus combined values.
    WavePlus,
    /// Wave 2 combined values.
    Wave2,
    /// Wave Mini combined values.
    WaveMini,
    /// Device clock of the first generation Wave.
    DateTime,
    /// Standalone temperature, hundredths of a degree.
    Temperature,
    /// Standalone humidity, hundredths of a percent.
    Humidity,
    /// Standalone radon 24 hour average.
    Radon1DayAvg,
    /// Standalone radon long term average.
    RadonLongTermAvg,
    /// Illuminance and accelerometer pair.
    IlluminanceAccelerometer,
    /// Response to [`COMMAND_BATTERY`] on the command characteristic.
    Command,
}

impl Decoder {
    /// Find the decoder for a characteristic UUID.
    pub fn for_characteristic(uuid: &Uuid) -> Option<Self> {
        let decoder = match *uuid {
            ble::WAVE_PLUS_DATA => Self::WavePlus,
            ble::WAVE_2_DATA => Self::Wave2,
            ble::WAVE_MINI_DATA => Self::WaveMini,
            ble::DATETIME => Self::DateTime,
            ble::TEMPERATURE => Self::Temperature,
            ble::HUMIDITY => Self::Humidity,
            ble::RADON_1DAY_AVG => Self::Radon1DayAvg,
            ble::RADON_LONGTERM_AVG => Self::RadonLongTermAvg,
            ble::ILLUMINANCE_ACCELEROMETER => Self::IlluminanceAccelerometer,
            ble::COMMAND => Self::Command,
            _ => return None,
        };
        Some(decoder)
    }

    /// The characteristic this decoder reads.
    pub fn characteristic(&self) -> Uuid {
        match self {
            Self::WavePlus => ble::WAVE_PLUS_DATA,
            Self::Wave2 => ble::WAVE_2_DATA,
            Self::WaveMini => ble::WAVE_MINI_DATA,
            Self::DateTime => ble::DATETIME,
            Self::Temperature => ble::TEMPERATURE,
            Self::Humidity => ble::HUMIDITY,
            Self::Radon1DayAvg => ble::RADON_1DAY_AVG,
            Self::RadonLongTermAvg => ble::RADON_LONGTERM_AVG,
            Self::IlluminanceAccelerometer => ble::ILLUMINANCE_ACCELEROMETER,
            Self::Command => ble::COMMAND,
        }
    }

    /// Whether the value arrives as a notification after a command write
    /// rather than through a plain read.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command)
    }

    /// Decode a raw payload into named values.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] when the payload is shorter
    /// than the layout, [`ParseError::UnsupportedVersion`] for an unknown
    /// combined-payload version, and [`ParseError::UnexpectedCommand`] when a
    /// command response does not echo [`COMMAND_BATTERY`].
    pub fn decode(&self, data: &[u8]) -> ParseResult<SensorData> {
        match self {
            Self::WavePlus => decode_wave_plus(data),
            Self::Wave2 => decode_wave_2(data),
            Self::WaveMini => decode_wave_mini(data),
            Self::DateTime => decode_date_time(data),
            Self::Temperature => {
                ensure_len(data, 2)?;
                let raw = (&data[..]).get_i16_le();
                Ok(single("temperature", f64::from(raw) / 100.0))
            }
            Self::Humidity => {
                ensure_len(data, 2)?;
                let raw = (&data[..]).get_u16_le();
                Ok(single("humidity", f64::from(raw) / 100.0))
            }
            Self::Radon1DayAvg => {
                ensure_len(data, 2)?;
                Ok(single("radon_1day_avg", f64::from((&data[..]).get_u16_le())))
            }
            Self::RadonLongTermAvg => {
                ensure_len(data, 2)?;
                Ok(single(
                    "radon_longterm_avg",
                    f64::from((&data[..]).get_u16_le()),
                ))
            }
            Self::IlluminanceAccelerometer => {
                ensure_len(data, 2)?;
                let mut values = SensorData::new();
                values.insert("illuminance".into(), f64::from(data[0]).into());
                values.insert("accelerometer".into(), f64::from(data[1]).into());
                Ok(values)
            }
            Self::Command => decode_command(data),
        }
    }
}

fn ensure_len(data: &[u8], expected: usize) -> ParseResult<()> {
    if data.len() < expected {
        return Err(ParseError::InsufficientBytes {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn single(field: &str, value: f64) -> SensorData {
    let mut values = SensorData::new();
    values.insert(field.to_string(), SensorValue::Number(value));
    values
}

fn insert_radon(values: &mut SensorData, field: &str, raw: u16) {
    if raw <= RADON_MAX {
        values.insert(field.to_string(), f64::from(raw).into());
    }
}

/// Layout `<BBBBHHHHHHHH`: version, humidity/2, light, waves,
/// radon short, radon long, temperature/100, pressure/50, CO2, VOC, 2 reserved.
fn decode_wave_plus(data: &[u8]) -> ParseResult<SensorData> {
    ensure_len(data, COMBINED_PAYLOAD_BYTES)?;

    let mut buf = data;
    let version = buf.get_u8();
    if version != 1 {
        return Err(ParseError::UnsupportedVersion(version));
    }
    let humidity = buf.get_u8();
    let _light = buf.get_u8();
    let _waves = buf.get_u8();
    let radon_short = buf.get_u16_le();
    let radon_long = buf.get_u16_le();
    let temperature = buf.get_i16_le();
    let pressure = buf.get_u16_le();
    let co2 = buf.get_u16_le();
    let voc = buf.get_u16_le();

    let mut values = SensorData::new();
    values.insert("humidity".into(), (f64::from(humidity) / 2.0).into());
    insert_radon(&mut values, "radon_1day_avg", radon_short);
    insert_radon(&mut values, "radon_longterm_avg", radon_long);
    values.insert("temperature".into(), (f64::from(temperature) / 100.0).into());
    values.insert("rel_atm_pressure".into(), (f64::from(pressure) / 50.0).into());
    values.insert("co2".into(), f64::from(co2).into());
    values.insert("voc".into(), f64::from(voc).into());
    Ok(values)
}

/// Layout `<4B8H`: same header as the Wave Plus without CO2/VOC/pressure.
fn decode_wave_2(data: &[u8]) -> ParseResult<SensorData> {
    ensure_len(data, COMBINED_PAYLOAD_BYTES)?;

    let mut buf = data;
    let version = buf.get_u8();
    if version != 1 {
        return Err(ParseError::UnsupportedVersion(version));
    }
    let humidity = buf.get_u8();
    buf.advance(2);
    let radon_short = buf.get_u16_le();
    let radon_long = buf.get_u16_le();
    let temperature = buf.get_i16_le();

    let mut values = SensorData::new();
    values.insert("humidity".into(), (f64::from(humidity) / 2.0).into());
    insert_radon(&mut values, "radon_1day_avg", radon_short);
    insert_radon(&mut values, "radon_longterm_avg", radon_long);
    values.insert("temperature".into(), (f64::from(temperature) / 100.0).into());
    Ok(values)
}

/// Layout `<HHHHHHLL`: ambient light, temperature in centi-kelvin,
/// pressure, humidity in hundredths, VOC, then reserved words.
fn decode_wave_mini(data: &[u8]) -> ParseResult<SensorData> {
    ensure_len(data, COMBINED_PAYLOAD_BYTES)?;

    let mut buf = data;
    let _light = buf.get_u16_le();
    let temperature = buf.get_u16_le();
    let _pressure = buf.get_u16_le();
    let humidity = buf.get_u16_le();
    let voc = buf.get_u16_le();

    let celsius = f64::from(temperature) / 100.0 - 273.15;
    let mut values = SensorData::new();
    values.insert("temperature".into(), ((celsius * 100.0).round() / 100.0).into());
    values.insert("humidity".into(), (f64::from(humidity) / 100.0).into());
    values.insert("voc".into(), f64::from(voc).into());
    Ok(values)
}

/// Layout `<HBBBBB`: year, month, day, hour, minute, second.
fn decode_date_time(data: &[u8]) -> ParseResult<SensorData> {
    ensure_len(data, 7)?;

    let mut buf = data;
    let year = buf.get_u16_le();
    let month = buf.get_u8();
    let day = buf.get_u8();
    let hour = buf.get_u8();
    let minute = buf.get_u8();
    let second = buf.get_u8();

    let invalid = |e: &dyn std::fmt::Display| ParseError::InvalidValue(format!("date_time: {e}"));
    let month = time::Month::try_from(month).map_err(|e| invalid(&e))?;
    let date = time::Date::from_calendar_date(i32::from(year), month, day).map_err(|e| invalid(&e))?;
    let clock = time::Time::from_hms(hour, minute, second).map_err(|e| invalid(&e))?;
    let stamp = time::PrimitiveDateTime::new(date, clock);

    let text = format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        stamp.year(),
        u8::from(stamp.month()),
        stamp.day(),
        stamp.hour(),
        stamp.minute(),
        stamp.second()
    );
    let mut values = SensorData::new();
    values.insert(DATE_TIME_FIELD.into(), SensorValue::Text(text));
    Ok(values)
}

/// Header `[command, status]` followed by a `<L12B6H` body.
fn decode_command(data: &[u8]) -> ParseResult<SensorData> {
    let expected = COMMAND_BODY_BYTES + 2;
    let Some(&command) = data.first() else {
        return Err(ParseError::InsufficientBytes {
            expected,
            actual: 0,
        });
    };
    if command != COMMAND_BATTERY {
        return Err(ParseError::UnexpectedCommand {
            expected: COMMAND_BATTERY,
            actual: command,
        });
    }
    ensure_len(data, expected)?;
    if data.len() > expected {
        return Err(ParseError::InvalidValue(format!(
            "command response is {} bytes, expected {expected}",
            data.len()
        )));
    }

    let mut buf = &data[2..];
    let _uptime = buf.get_u32_le();
    let mut small = [0u8; 12];
    buf.copy_to_slice(&mut small);
    let mut words = [0u16; 6];
    for word in &mut words {
        *word = buf.get_u16_le();
    }

    let mut values = SensorData::new();
    values.insert("illuminance".into(), f64::from(small[1]).into());
    values.insert("battery".into(), (f64::from(words[4]) / 1000.0).into());
    Ok(values)
}
