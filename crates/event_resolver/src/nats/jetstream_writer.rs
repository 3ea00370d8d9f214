use crate::pipeline::{MessageWriter, OutboundMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use common::nats::JetStreamPublisher;
use std::sync::Arc;
use tracing::debug;

/// Publishes outbound messages to `{base_subject}.{key}` and waits for the
/// JetStream acknowledgment
pub struct JetStreamMessageWriter {
    publisher: Arc<dyn JetStreamPublisher>,
    base_subject: String,
}

impl JetStreamMessageWriter {
    pub fn new(publisher: Arc<dyn JetStreamPublisher>, base_subject: impl Into<String>) -> Self {
        Self {
            publisher,
            base_subject: base_subject.into(),
        }
    }

    pub fn subject_for(&self, key: &str) -> String {
        format!("{}.{}", self.base_subject, key)
    }
}

#[async_trait]
impl MessageWriter for JetStreamMessageWriter {
    async fn write(&self, message: OutboundMessage) -> Result<()> {
        let subject = self.subject_for(&message.key);
        let size_bytes = message.payload.len();

        self.publisher
            .publish(subject.clone(), message.payload)
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!(subject = %subject, size_bytes, "Published outbound message");
        Ok(())
    }
}
