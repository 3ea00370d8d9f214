use crate::pipeline::{InboundMessage, MessageSource};
use anyhow::{Context, Result};
use async_nats::jetstream::consumer::pull::Config as PullConfig;
use async_trait::async_trait;
use common::nats::{JetStreamConsumer, PullConsumer, PulledMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Message source backed by a durable JetStream pull consumer
///
/// Messages are fetched in batches and acknowledged one at a time, after the
/// pipeline has put them on its inbound queue. Anything still buffered when
/// the source is dropped was never acknowledged and is redelivered by the
/// broker. A fetch runs on its own task: if the inbound loop drops a pending
/// read, the batch is still collected and handed out by the next read.
pub struct JetStreamMessageSource {
    consumer: Arc<dyn PullConsumer>,
    batch_size: usize,
    batch_wait: Duration,
    buffered: VecDeque<PulledMessage>,
    in_flight: Option<PulledMessage>,
    pending_fetch: Option<JoinHandle<Result<Vec<PulledMessage>>>>,
}

impl JetStreamMessageSource {
    /// Create (or bind to) a durable consumer on `stream_name` filtered to `filter_subject`
    pub async fn new(
        consumer_client: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        filter_subject: &str,
        batch_size: usize,
        batch_wait_secs: u64,
    ) -> Result<Self> {
        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            subject = %filter_subject,
            "Creating JetStream pull consumer"
        );

        let config = PullConfig {
            durable_name: Some(consumer_name.to_string()),
            filter_subject: filter_subject.to_string(),
            ..Default::default()
        };
        let consumer = consumer_client
            .create_consumer(config, stream_name)
            .await
            .with_context(|| format!("Failed to create consumer {}", consumer_name))?;

        info!(
            stream = %stream_name,
            consumer = %consumer_name,
            "JetStream message source ready"
        );

        Ok(Self::from_pull_consumer(
            Arc::from(consumer),
            batch_size,
            Duration::from_secs(batch_wait_secs),
        ))
    }

    pub fn from_pull_consumer(
        consumer: Arc<dyn PullConsumer>,
        batch_size: usize,
        batch_wait: Duration,
    ) -> Self {
        Self {
            consumer,
            batch_size: batch_size.max(1),
            batch_wait,
            buffered: VecDeque::new(),
            in_flight: None,
            pending_fetch: None,
        }
    }
}

#[async_trait]
impl MessageSource for JetStreamMessageSource {
    async fn next_message(&mut self) -> Result<Option<InboundMessage>> {
        loop {
            if let Some(message) = self.buffered.pop_front() {
                let inbound = InboundMessage {
                    key: Some(message.subject.clone()),
                    payload: message.payload.clone(),
                };
                self.in_flight = Some(message);
                return Ok(Some(inbound));
            }

            let consumer = Arc::clone(&self.consumer);
            let (batch_size, batch_wait) = (self.batch_size, self.batch_wait);
            let fetch = self.pending_fetch.get_or_insert_with(|| {
                tokio::spawn(async move { consumer.fetch_messages(batch_size, batch_wait).await })
            });

            let joined = fetch.await;
            self.pending_fetch = None;
            let batch = joined.context("JetStream fetch task failed")??;

            if !batch.is_empty() {
                debug!(message_count = batch.len(), "Buffered JetStream batch");
            }
            self.buffered.extend(batch);
        }
    }

    async fn acknowledge(&mut self) -> Result<()> {
        let Some(message) = self.in_flight.take() else {
            return Ok(());
        };
        message
            .ack()
            .await
            .with_context(|| format!("Failed to acknowledge message on {}", message.subject))
    }
}

impl Drop for JetStreamMessageSource {
    fn drop(&mut self) {
        // Fetches do not acknowledge, so aborting one loses nothing
        if let Some(fetch) = self.pending_fetch.take() {
            fetch.abort();
        }
        let unacknowledged = self.buffered.len() + usize::from(self.in_flight.is_some());
        if unacknowledged > 0 {
            debug!(
                unacknowledged,
                "Dropping unacknowledged JetStream messages for redelivery"
            );
        }
    }
}
