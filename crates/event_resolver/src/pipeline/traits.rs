use async_trait::async_trait;
use bytes::Bytes;
use common::domain::DomainError;
use std::sync::Arc;
use tracing::{error, warn};

/// Raw message taken from the external source, passed through untouched
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub key: Option<String>,
    pub payload: Bytes,
}

/// Encoded message handed to an external writer
///
/// The key is a stable identifier the writer uses for partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub key: String,
    pub payload: Bytes,
}

/// Pull-based reader over the external message source
///
/// The inbound loop drops an in-flight `next_message` future on shutdown, so
/// implementations must not lose a message they already took when that happens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Read the next message; `Ok(None)` signals end of stream
    async fn next_message(&mut self) -> anyhow::Result<Option<InboundMessage>>;

    /// Called once the message last returned by `next_message` is on the
    /// inbound queue. Sources without acknowledgments keep the default.
    async fn acknowledge(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writer for one outbound stream
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageWriter: Send + Sync {
    async fn write(&self, message: OutboundMessage) -> anyhow::Result<()>;
}

/// Receives the errors the loops report but do not act on
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ResponseHandler: Send + Sync {
    fn read_failed(&self, error: &anyhow::Error);

    fn ack_failed(&self, error: &anyhow::Error);

    fn encode_failed(&self, stream: &str, error: &DomainError);

    fn write_failed(&self, stream: &str, key: &str, error: &anyhow::Error);
}

/// Reports loop errors through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingResponseHandler;

impl ResponseHandler for LoggingResponseHandler {
    fn read_failed(&self, error: &anyhow::Error) {
        error!(error = %format!("{:#}", error), "Failed to read inbound message");
    }

    fn ack_failed(&self, error: &anyhow::Error) {
        warn!(
            error = %format!("{:#}", error),
            "Failed to acknowledge enqueued message, it may be redelivered"
        );
    }

    fn encode_failed(&self, stream: &str, error: &DomainError) {
        error!(stream = %stream, error = %error, "Failed to encode outbound event");
    }

    fn write_failed(&self, stream: &str, key: &str, error: &anyhow::Error) {
        error!(
            stream = %stream,
            key = %key,
            error = %format!("{:#}", error),
            "Failed to write outbound message"
        );
    }
}

/// Side channel for messages that could not be decoded
///
/// Kept apart from the failed-event stream: an undecodable message never
/// becomes a typed failed event.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InvalidMessageSink: Send + Sync {
    async fn invalid_message(&self, message: &InboundMessage, error: &DomainError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInvalidMessageSink;

#[async_trait]
impl InvalidMessageSink for LoggingInvalidMessageSink {
    async fn invalid_message(&self, message: &InboundMessage, error: &DomainError) {
        warn!(
            key = message.key.as_deref().unwrap_or(""),
            payload_size = message.payload.len(),
            error = %error,
            "Dropping undecodable message"
        );
    }
}

/// Forwards the untouched raw bytes of undecodable messages to a dead-letter writer
pub struct WriterInvalidMessageSink {
    writer: Arc<dyn MessageWriter>,
}

impl WriterInvalidMessageSink {
    pub const KEY: &'static str = "invalid";

    pub fn new(writer: Arc<dyn MessageWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl InvalidMessageSink for WriterInvalidMessageSink {
    async fn invalid_message(&self, message: &InboundMessage, error: &DomainError) {
        warn!(
            key = message.key.as_deref().unwrap_or(""),
            payload_size = message.payload.len(),
            error = %error,
            "Forwarding undecodable message to dead-letter stream"
        );

        let outbound = OutboundMessage {
            key: Self::KEY.to_string(),
            payload: message.payload.clone(),
        };
        if let Err(e) = self.writer.write(outbound).await {
            error!(
                error = %format!("{:#}", e),
                "Failed to write undecodable message to dead-letter stream"
            );
        }
    }
}
