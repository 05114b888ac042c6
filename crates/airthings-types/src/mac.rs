//! Bluetooth MAC addresses as used in configuration and MQTT topics.

use core::fmt;
use core::str::FromStr;

use macaddr::MacAddr6;

use crate::error::ParseError;

/// A validated Bluetooth device address.
///
/// Accepts twelve hexadecimal digits, either undelimited or separated into
/// pairs by a single consistent delimiter (`:` or `-`). Parsing is
/// case-insensitive. The address always displays in lowercase colon form,
/// which is the form used in value topics and unique ids.
///
/// # Examples
///
/// ```
/// use airthings_types::MacAddress;
///
/// let a: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
/// let b: MacAddress = "aabbccddeeff".parse().unwrap();
/// let c: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// assert_eq!(a.to_string(), "aa:bb:cc:dd:ee:ff");
/// assert_eq!(a.compact(), "aabbccddeeff");
///
/// assert!("AA:BB:CC:DD:EE".parse::<MacAddress>().is_err());
/// assert!("GG:BB:CC:DD:EE:FF".parse::<MacAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress(MacAddr6);

impl MacAddress {
    /// Build an address from its six octets, most significant first.
    pub const fn new(octets: [u8; 6]) -> Self {
        let [a, b, c, d, e, f] = octets;
        Self(MacAddr6::new(a, b, c, d, e, f))
    }

    /// The six octets of the address.
    pub fn octets(&self) -> [u8; 6] {
        self.0.into_array()
    }

    /// Lowercase hex without delimiters, e.g. `aabbccddeeff`.
    pub fn compact(&self) -> String {
        self.octets().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Check whether a string is a well-formed MAC address.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<Self>().is_ok()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self::new(octets)
    }
}

impl From<MacAddr6> for MacAddress {
    fn from(addr: MacAddr6) -> Self {
        Self(addr)
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());
        if !s.is_ascii() {
            return Err(invalid());
        }
        let bytes = s.as_bytes();

        let delimiter = match bytes.len() {
            12 => None,
            17 => match bytes[2] {
                d @ (b':' | b'-') => Some(d),
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };

        let stride = if delimiter.is_some() { 3 } else { 2 };
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let start = i * stride;
            if let Some(d) = delimiter
                && i > 0
                && bytes[start - 1] != d
            {
                return Err(invalid());
            }
            let pair = &s[start..start + 2];
            if !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }

        Ok(Self::new(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.octets();
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_colon_form() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_accepts_bare_and_hyphen_forms() {
        let bare: MacAddress = "aabbccddeeff".parse().unwrap();
        let hyphen: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(bare, hyphen);
        assert_eq!(bare.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_rejects_short_address() {
        assert!(matches!(
            "AA:BB:CC:DD:EE".parse::<MacAddress>(),
            Err(ParseError::InvalidMacAddress(_))
        ));
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!("GG:BB:CC:DD:EE:FF".parse::<MacAddress>().is_err());
        assert!("aabbccddeefg".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_rejects_mixed_delimiters() {
        assert!("aa:bb-cc:dd:ee:ff".parse::<MacAddress>().is_err());
        assert!("aa.bb.cc.dd.ee.ff".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_rejects_sign_characters() {
        // from_str_radix would accept a leading '+', the hex check must not.
        assert!("+a:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_compact_form() {
        let mac = MacAddress::new([0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]);
        assert_eq!(mac.compact(), "0a1b2c3d4e5f");
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let mac: MacAddress = "AA-BB-CC-DD-EE-01".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"aa:bb:cc:dd:ee:01\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }

    proptest! {
        #[test]
        fn prop_all_forms_normalize_identically(octets in any::<[u8; 6]>()) {
            let colon = octets.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(":");
            let hyphen = octets.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join("-");
            let bare: String = octets.iter().map(|b| format!("{b:02x}")).collect();

            let a: MacAddress = colon.parse().unwrap();
            let b: MacAddress = hyphen.parse().unwrap();
            let c: MacAddress = bare.parse().unwrap();
            prop_assert_eq!(a, b);
            prop_assert_eq!(b, c);
            prop_assert_eq!(a.compact(), bare);
        }

        #[test]
        fn prop_never_panics(s in "\\PC*") {
            let _ = s.parse::<MacAddress>();
        }
    }
}
