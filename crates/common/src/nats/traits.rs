use anyhow::Result;
use async_nats::jetstream;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Acknowledges one pulled message back to the broker
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageAcker: Send + Sync {
    async fn ack(&self) -> Result<()>;
}

/// A message pulled from JetStream, detached from the async-nats message type
///
/// The broker redelivers it after the ack wait unless `ack` is called.
#[derive(Clone)]
pub struct PulledMessage {
    pub subject: String,
    pub payload: Bytes,
    acker: Option<Arc<dyn MessageAcker>>,
}

impl PulledMessage {
    /// A message with nothing to acknowledge
    pub fn new(subject: impl Into<String>, payload: Bytes) -> Self {
        Self {
            subject: subject.into(),
            payload,
            acker: None,
        }
    }

    pub fn with_acker(
        subject: impl Into<String>,
        payload: Bytes,
        acker: Arc<dyn MessageAcker>,
    ) -> Self {
        Self {
            subject: subject.into(),
            payload,
            acker: Some(acker),
        }
    }

    pub async fn ack(&self) -> Result<()> {
        match &self.acker {
            Some(acker) => acker.ack().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PulledMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulledMessage")
            .field("subject", &self.subject)
            .field("payload_size", &self.payload.len())
            .field("ackable", &self.acker.is_some())
            .finish()
    }
}

/// Trait for JetStream consumer operations
/// Abstracts the operations needed to create and use a NATS JetStream consumer
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait JetStreamConsumer: Send + Sync {
    /// Create a durable pull consumer on a stream
    async fn create_consumer(
        &self,
        config: jetstream::consumer::pull::Config,
        stream_name: &str,
    ) -> Result<Box<dyn PullConsumer>>;
}

/// Trait for pull consumer operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PullConsumer: Send + Sync {
    /// Fetch up to `max_messages`, waiting at most `expires`
    /// Returned messages are not acknowledged yet; see `PulledMessage::ack`
    async fn fetch_messages(
        &self,
        max_messages: usize,
        expires: std::time::Duration,
    ) -> Result<Vec<PulledMessage>>;
}

/// Trait for JetStream publisher operations
/// Abstracts the operations needed to create streams and publish messages
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait JetStreamPublisher: Send + Sync {
    /// Get an existing stream by name
    async fn get_stream(&self, stream_name: &str) -> Result<()>;

    /// Create a new stream with the given configuration
    async fn create_stream(&self, config: jetstream::stream::Config) -> Result<()>;

    /// Publish a message to a subject and await acknowledgment
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ack_delegates_to_acker() {
        let mut acker = MockMessageAcker::new();
        acker.expect_ack().times(1).returning(|| Ok(()));
        let message = PulledMessage::with_acker(
            "inbound_events.mqtt",
            Bytes::from_static(b"event"),
            Arc::new(acker),
        );

        let result = message.ack().await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_message_without_acker_acks_trivially() {
        let message = PulledMessage::new("inbound_events.mqtt", Bytes::from_static(b"event"));

        assert!(message.ack().await.is_ok());
    }
}
