//! Polling loop that turns sensor readings into MQTT batches.
//!
//! Each cycle reads every device once and publishes one batch of values.
//! The first cycle that yields data also publishes the discovery batch,
//! followed by a short settle delay so Home Assistant has created the
//! entities before their first state arrives.

use std::time::Duration;

use tracing::{error, info, warn};

use airthings_core::{DeviceSession, SensorBackend, SessionError};

use crate::config::Config;
use crate::discovery::discovery_messages;
use crate::mqtt::{MessageSink, PublishError};
use crate::values::value_messages;

/// Delay between the discovery batch and the first value batch.
pub const DISCOVERY_SETTLE: Duration = Duration::from_secs(5);

/// Errors from one polling cycle.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to retrieve sensor data: {0}")]
    Read(#[from] SessionError),
    #[error("No sensor data received")]
    NoData,
    #[error("Failed to publish {batch} batch: {source}")]
    Publish {
        batch: &'static str,
        #[source]
        source: PublishError,
    },
}

impl BridgeError {
    /// `true` if the devices did not deliver data.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Self::Read(_) | Self::NoData)
    }
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub discovery_messages: usize,
    pub value_messages: usize,
}

/// Bridge between a device session and a message sink.
pub struct Bridge<B, S> {
    session: DeviceSession<B>,
    sink: S,
    retain: bool,
    discovery: bool,
    refresh_interval: Duration,
    exit_on_read_failure: bool,
    discovery_sent: bool,
    first_publish: bool,
}

impl<B, S> Bridge<B, S>
where
    B: SensorBackend,
    S: MessageSink,
{
    /// Create a bridge over a session whose devices are set up.
    pub fn new(session: DeviceSession<B>, sink: S, config: &Config) -> Self {
        Self {
            session,
            sink,
            retain: config.mqtt_retain,
            discovery: config.mqtt_discovery,
            refresh_interval: config.refresh_interval(),
            exit_on_read_failure: config.exit_on_read_failure,
            discovery_sent: false,
            first_publish: true,
        }
    }

    pub fn session(&self) -> &DeviceSession<B> {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// `true` once the discovery batch went out.
    pub fn discovery_sent(&self) -> bool {
        self.discovery_sent
    }

    /// Poll every device once and publish the result.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, BridgeError> {
        let readings = self.session.fetch_readings().await?;
        if readings.is_empty() {
            return Err(BridgeError::NoData);
        }

        let mut report = CycleReport::default();

        if self.discovery && !self.discovery_sent {
            let messages = discovery_messages(self.session.devices(), &readings);
            info!("Sending {} discovery message(s)", messages.len());
            self.sink
                .publish_batch(&messages)
                .await
                .map_err(|source| BridgeError::Publish {
                    batch: "discovery",
                    source,
                })?;
            self.discovery_sent = true;
            report.discovery_messages = messages.len();
            tokio::time::sleep(DISCOVERY_SETTLE).await;
        }

        let clear_retained = self.first_publish && !self.retain;
        let messages = value_messages(&readings, self.retain, clear_retained);
        self.sink
            .publish_batch(&messages)
            .await
            .map_err(|source| BridgeError::Publish {
                batch: "value",
                source,
            })?;
        self.first_publish = false;
        report.value_messages = messages.len();

        Ok(report)
    }

    /// Run cycles until a fatal error.
    ///
    /// A failed cycle is logged and retried after the refresh interval,
    /// unless it failed to read and `exit_on_read_failure` is set.
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    "Cycle done ({} discovery, {} value message(s))",
                    report.discovery_messages, report.value_messages
                ),
                Err(e) if e.is_read_failure() && self.exit_on_read_failure => {
                    error!("{}", e);
                    return Err(e);
                }
                Err(e) if e.is_read_failure() => error!("{}", e),
                Err(e) => warn!("{}", e),
            }

            info!("Sleeping for {} s", self.refresh_interval.as_secs());
            tokio::time::sleep(self.refresh_interval).await;
        }
    }
}
