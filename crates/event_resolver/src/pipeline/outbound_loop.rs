use crate::pipeline::traits::{MessageWriter, OutboundMessage, ResponseHandler};
use common::domain::{DomainResult, EventCodec, EventResolutionResult, FailedEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Item carried on an outbound queue
pub trait OutboundItem: Send + 'static {
    /// Encode into keyed outbound messages; each entry fails independently
    fn encode(&self, codec: &dyn EventCodec) -> Vec<DomainResult<OutboundMessage>>;
}

/// Resolved events are keyed by device id
impl OutboundItem for Vec<EventResolutionResult> {
    fn encode(&self, codec: &dyn EventCodec) -> Vec<DomainResult<OutboundMessage>> {
        self.iter()
            .map(|result| {
                let event = &result.resolved_event;
                codec
                    .encode_resolved_event(event)
                    .map(|payload| OutboundMessage {
                        key: event.device_id.to_string(),
                        payload: payload.into(),
                    })
            })
            .collect()
    }
}

/// Failed events are keyed by reason code
impl OutboundItem for FailedEvent {
    fn encode(&self, codec: &dyn EventCodec) -> Vec<DomainResult<OutboundMessage>> {
        vec![codec
            .encode_failed_event(self)
            .map(|payload| OutboundMessage {
                key: self.reason.code().to_string(),
                payload: payload.into(),
            })]
    }
}

/// Drains one outbound queue into its writer
///
/// Encode and write errors go to the response handler; the loop keeps going.
pub struct OutboundLoop<T: OutboundItem> {
    stream: &'static str,
    queue: mpsc::Receiver<T>,
    codec: Arc<dyn EventCodec>,
    writer: Arc<dyn MessageWriter>,
    response_handler: Arc<dyn ResponseHandler>,
}

impl<T: OutboundItem> OutboundLoop<T> {
    pub fn new(
        stream: &'static str,
        queue: mpsc::Receiver<T>,
        codec: Arc<dyn EventCodec>,
        writer: Arc<dyn MessageWriter>,
        response_handler: Arc<dyn ResponseHandler>,
    ) -> Self {
        Self {
            stream,
            queue,
            codec,
            writer,
            response_handler,
        }
    }

    /// Run until the queue is closed and empty
    pub async fn run(mut self) {
        info!(stream = self.stream, "Outbound loop started");
        let mut written: u64 = 0;

        while let Some(item) = self.queue.recv().await {
            for encoded in item.encode(self.codec.as_ref()) {
                let message = match encoded {
                    Ok(message) => message,
                    Err(e) => {
                        self.response_handler.encode_failed(self.stream, &e);
                        continue;
                    }
                };

                let key = message.key.clone();
                match self.writer.write(message).await {
                    Ok(()) => {
                        written += 1;
                        debug!(stream = self.stream, key = %key, "Wrote outbound message");
                    }
                    Err(e) => self.response_handler.write_failed(self.stream, &key, &e),
                }
            }
        }

        info!(stream = self.stream, written, "Outbound loop drained");
    }
}
