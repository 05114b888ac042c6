//! MQTT transport for batches of sensor messages.
//!
//! # Topic Structure
//!
//! - `airthings/{mac}/{field}` - formatted sensor value
//! - `homeassistant/sensor/airthings_{compact mac}/{field}/config` - discovery
//!
//! Where `{mac}` is the lowercase colon form (`aa:bb:cc:dd:ee:ff`) and
//! `{compact mac}` the same without colons.
//!
//! # Connections
//!
//! [`RumqttSink`] opens one connection per batch: connect, publish every
//! message at QoS 0, disconnect. The whole exchange is bounded by a timeout,
//! so an unreachable broker fails the batch instead of stalling the loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use tracing::{debug, info};

use airthings_core::MacAddress;

use crate::config::Config;

/// Prefix of value topics.
pub const VALUE_TOPIC_PREFIX: &str = "airthings";

/// Prefix of Home Assistant discovery topics.
pub const DISCOVERY_TOPIC_PREFIX: &str = "homeassistant";

/// Default bound on one batch exchange.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Topic a formatted value is published to.
pub fn value_topic(mac: &MacAddress, field: &str) -> String {
    format!("{}/{}/{}", VALUE_TOPIC_PREFIX, mac, field)
}

/// Topic the discovery config of a field is published to.
pub fn discovery_topic(mac: &MacAddress, field: &str) -> String {
    format!(
        "{}/sensor/airthings_{}/{}/config",
        DISCOVERY_TOPIC_PREFIX,
        mac.compact(),
        field
    )
}

/// A message ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MqttMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>, retain: bool) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain,
        }
    }
}

/// MQTT publishing errors.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("MQTT exchange with {broker} timed out after {timeout:?}")]
    Timeout { broker: String, timeout: Duration },
    #[error("MQTT broker rejected the batch: {0}")]
    Rejected(String),
}

/// Destination of message batches.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Publish every message of `messages`, in order.
    async fn publish_batch(&self, messages: &[MqttMessage]) -> Result<(), PublishError>;
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl BrokerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: config.mqtt_client_id.clone(),
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
        }
    }

    /// Credentials, only when both user name and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((&self.username, &self.password))
        }
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let Some((username, password)) = self.credentials() {
            options.set_credentials(username, password);
        }
        options
    }

    fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Publishes batches through a fresh rumqttc connection each time.
#[derive(Debug, Clone)]
pub struct RumqttSink {
    options: BrokerOptions,
    timeout: Duration,
}

impl RumqttSink {
    pub fn new(options: BrokerOptions) -> Self {
        Self {
            options,
            timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Bound the duration of one batch exchange.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn exchange(&self, messages: &[MqttMessage]) -> Result<(), PublishError> {
        // Requests are queued before the event loop runs, so the queue
        // must hold every publish plus the disconnect.
        let (client, mut eventloop) =
            AsyncClient::new(self.options.mqtt_options(), messages.len() + 1);

        for message in messages {
            client
                .publish(
                    &message.topic,
                    QoS::AtMostOnce,
                    message.retain,
                    message.payload.as_bytes(),
                )
                .await?;
        }
        client.disconnect().await?;

        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    if ack.code != rumqttc::ConnectReturnCode::Success {
                        return Err(PublishError::Rejected(format!("{:?}", ack.code)));
                    }
                    debug!("MQTT connected to {}", self.options.broker());
                }
                Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
                _ => {}
            }
        }
    }
}

#[async_trait]
impl MessageSink for RumqttSink {
    async fn publish_batch(&self, messages: &[MqttMessage]) -> Result<(), PublishError> {
        if messages.is_empty() {
            return Ok(());
        }

        match tokio::time::timeout(self.timeout, self.exchange(messages)).await {
            Ok(result) => {
                result?;
                info!(
                    "Published {} message(s) to {}",
                    messages.len(),
                    self.options.broker()
                );
                Ok(())
            }
            Err(_) => Err(PublishError::Timeout {
                broker: self.options.broker(),
                timeout: self.timeout,
            }),
        }
    }
}

/// In-memory sink that records every batch.
///
/// Clones share the same record, so one clone can be handed to a bridge
/// while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    batches: Vec<Vec<MqttMessage>>,
    failures: u32,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` batches fail without being recorded.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut state) = self.inner.lock() {
            state.failures = count;
        }
    }

    /// Every recorded batch, oldest first.
    pub fn batches(&self) -> Vec<Vec<MqttMessage>> {
        self.inner
            .lock()
            .map(|state| state.batches.clone())
            .unwrap_or_default()
    }

    /// Every recorded message, in publish order.
    pub fn messages(&self) -> Vec<MqttMessage> {
        self.batches().into_iter().flatten().collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.batches.clear();
        }
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn publish_batch(&self, messages: &[MqttMessage]) -> Result<(), PublishError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| PublishError::Rejected("recording sink poisoned".to_string()))?;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(PublishError::Rejected("injected failure".to_string()));
        }
        state.batches.push(messages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        "AA:BB:CC:DD:EE:FF".parse().unwrap()
    }

    #[test]
    fn test_value_topic() {
        assert_eq!(value_topic(&mac(), "co2"), "airthings/aa:bb:cc:dd:ee:ff/co2");
    }

    #[test]
    fn test_discovery_topic() {
        assert_eq!(
            discovery_topic(&mac(), "temperature"),
            "homeassistant/sensor/airthings_aabbccddeeff/temperature/config"
        );
    }

    #[test]
    fn test_credentials_require_both() {
        let mut options = BrokerOptions::from_config(&Config::default());
        assert_eq!(options.credentials(), None);

        options.username = "user".to_string();
        assert_eq!(options.credentials(), None);

        options.password = "pass".to_string();
        assert_eq!(options.credentials(), Some(("user", "pass")));

        options.username.clear();
        assert_eq!(options.credentials(), None);
    }

    #[test]
    fn test_broker_options_from_config() {
        let config = Config {
            mqtt_host: "broker.lan".to_string(),
            mqtt_port: 8883,
            ..Config::default()
        };
        let options = BrokerOptions::from_config(&config);
        assert_eq!(options.broker(), "broker.lan:8883");
        assert_eq!(options.client_id, "airthings-mqtt");
    }

    #[tokio::test]
    async fn test_empty_batch_needs_no_broker() {
        let mut options = BrokerOptions::from_config(&Config::default());
        options.port = 1;
        let sink = RumqttSink::new(options).timeout(Duration::from_millis(1));
        assert!(sink.publish_batch(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::new();
        let observer = sink.clone();
        let batch = [
            MqttMessage::new("a/b", "1", false),
            MqttMessage::new("a/c", "", true),
        ];

        sink.fail_next(1);
        assert!(sink.publish_batch(&batch).await.is_err());
        assert!(observer.batches().is_empty());

        sink.publish_batch(&batch).await.unwrap();
        assert_eq!(observer.batches().len(), 1);
        assert_eq!(observer.messages(), batch);

        observer.clear();
        assert!(sink.messages().is_empty());
    }
}
