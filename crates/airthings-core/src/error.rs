//! Error types for airthings-core.
//!
//! This module defines the errors that can occur while discovering and
//! reading Airthings devices over Bluetooth Low Energy, and the
//! classification the retry loop uses to decide whether another attempt is
//! worthwhile.
//!
//! # Failure classification
//!
//! | Error | [`FailureKind`] | Retried |
//! |-------|-----------------|---------|
//! | [`Error::Bluetooth`] | `TransientIo` | yes |
//! | [`Error::Timeout`] | `TransientIo` | yes |
//! | [`Error::Io`] | `TransientIo` | yes |
//! | [`Error::NotConnected`] | `UnreachableDevice` | yes |
//! | [`Error::DeviceNotFound`] | `UnreachableDevice` | yes |
//! | [`Error::CharacteristicNotFound`] | `UnreachableDevice` | yes |
//! | [`Error::InvalidReadingFormat`] | `TransientIo` | yes |
//! | [`Error::UnexpectedResponse`] | `TransientIo` | yes |
//! | [`Error::InvalidData`] | `MalformedData` | no |
//! | [`Error::InvalidConfig`] | `MalformedData` | no |
//!
//! An unreachable device is retried because the radio link to a sensor a few
//! rooms away drops in and out. A truncated read or a notification answering
//! an earlier command comes from the same flaky link. A value out of range or
//! an unknown format version will be just as wrong on the next attempt.

use std::time::Duration;

use thiserror::Error;

use airthings_types::ParseError;

/// Errors that can occur when communicating with Airthings devices.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Operation attempted while not connected to device.
    #[error("Not connected to device")]
    NotConnected,

    /// Required BLE characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// Failed to parse data received from device.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Invalid reading format from sensor.
    #[error("Invalid reading format: expected {expected} bytes, got {actual}")]
    InvalidReadingFormat {
        /// Expected data size.
        expected: usize,
        /// Actual data size received.
        actual: usize,
    },

    /// A command notification answered a different command.
    #[error("Unexpected response: expected command 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedResponse {
        /// Command byte that was written.
        expected: u8,
        /// Command byte the device echoed.
        actual: u8,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of a failure, used by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Radio or OS level hiccup; the next attempt may succeed.
    TransientIo,
    /// The payload or the request is wrong; retrying cannot help.
    MalformedData,
    /// The device did not answer or lacks what was asked for.
    UnreachableDevice,
}

impl FailureKind {
    /// Whether an error of this kind is worth another attempt.
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureKind::MalformedData)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransientIo => write!(f, "transient I/O failure"),
            Self::MalformedData => write!(f, "malformed data"),
            Self::UnreachableDevice => write!(f, "unreachable device"),
        }
    }
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// Device with specified address not found.
    NotFound { identifier: String },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Classify this error for the retry loop.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Bluetooth(_)
            | Error::Timeout { .. }
            | Error::Io(_)
            | Error::InvalidReadingFormat { .. }
            | Error::UnexpectedResponse { .. } => FailureKind::TransientIo,
            Error::NotConnected
            | Error::DeviceNotFound(_)
            | Error::CharacteristicNotFound { .. } => FailureKind::UnreachableDevice,
            Error::InvalidData(_) | Error::InvalidConfig(_) => FailureKind::MalformedData,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InsufficientBytes { expected, actual } => {
                Error::InvalidReadingFormat { expected, actual }
            }
            ParseError::UnexpectedCommand { expected, actual } => {
                Error::UnexpectedResponse { expected, actual }
            }
            ParseError::InvalidValue(msg) => Error::InvalidData(msg),
            // Handle future ParseError variants (non_exhaustive)
            other => Error::InvalidData(other.to_string()),
        }
    }
}

/// Result type alias using airthings-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a [`DeviceSession`](crate::DeviceSession) step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Discovery ran but found no Airthings devices.
    #[error("No Airthings devices found")]
    NoDevicesFound,

    /// Discovery itself failed.
    #[error("Device discovery failed: {0}")]
    Discovery(#[source] Error),

    /// Every attempt of a backend call failed.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// The backend call that failed.
        operation: &'static str,
        /// Number of attempts made.
        attempts: u32,
        /// The error of the last attempt.
        #[source]
        source: Error,
    },
}
