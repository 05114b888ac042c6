//! Error types for data parsing in airthings-types.

use thiserror::Error;

/// Errors that can occur when parsing Airthings sensor data or identifiers.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in airthings-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload is shorter than the decoder's fixed layout.
    #[error("Insufficient bytes: requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Bytes required by the layout.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// The payload carries a format version this crate cannot decode.
    #[error("Unsupported sensor format version {0}")]
    UnsupportedVersion(u8),

    /// A command response answered a different command than the one sent.
    #[error("Unexpected command response: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedCommand {
        /// Command byte that was written.
        expected: u8,
        /// Command byte echoed by the device.
        actual: u8,
    },

    /// A field holds a value outside its valid range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A string is not a valid MAC address.
    #[error("Invalid MAC address '{0}'")]
    InvalidMacAddress(String),
}

/// Result type alias using airthings-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_bytes_display() {
        let err = ParseError::InsufficientBytes {
            expected: 20,
            actual: 4,
        };
        assert_eq!(err.to_string(), "Insufficient bytes: requires 20 bytes, got 4");
    }

    #[test]
    fn test_unexpected_command_display() {
        let err = ParseError::UnexpectedCommand {
            expected: 0x6d,
            actual: 0x01,
        };
        assert!(err.to_string().contains("0x6d"));
        assert!(err.to_string().contains("0x01"));
    }
}
