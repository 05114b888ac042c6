//! Retry logic for BLE operations.
//!
//! Airthings sensors are read over a radio link that drops out regularly, so
//! every library call the session makes is wrapped in a bounded retry with a
//! fixed wait between attempts.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use airthings_core::{RetryConfig, with_retry, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! // At most 10 attempts, 3 seconds apart
//! let config = RetryConfig::new(10, Duration::from_secs(3));
//!
//! let result = with_retry(&config, "get_sensor_data", || async {
//!     // Your BLE operation here
//!     Ok::<_, Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one. Must be at least 1.
    pub attempts: u32,
    /// Delay between a failed attempt and the next one.
    pub wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            wait: Duration::from_secs(3),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config.
    pub fn new(attempts: u32, wait: Duration) -> Self {
        Self { attempts, wait }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            wait: Duration::ZERO,
        }
    }

    /// Set maximum number of attempts.
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the wait between attempts.
    #[must_use]
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Check that the configuration can run an operation at all.
    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(Error::invalid_config("retry attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Execute an async operation with retry logic.
///
/// The operation runs at most `config.attempts` times. Every failed attempt
/// except the last is followed by one sleep of `config.wait`. Errors whose
/// [`kind`](Error::kind) is not retryable are returned immediately.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `config.attempts` is zero, otherwise
/// the error of the last attempt.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    config.validate()?;

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.kind().is_retryable() {
                    debug!("{} failed with {}: {}", operation_name, e.kind(), e);
                    return Err(e);
                }
                if attempt >= config.attempts {
                    return Err(e);
                }

                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    operation_name, attempt, config.attempts, e, config.wait
                );
                sleep(config.wait).await;
                attempt += 1;
            }
        }
    }
}
