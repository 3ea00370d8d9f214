use crate::pipeline::traits::{InboundMessage, MessageSource, ResponseHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a single `pump`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    Enqueued,
    EndOfStream,
    ReadFailed,
    /// Every resolver is gone; nothing will drain the queue again
    QueueClosed,
    Cancelled,
}

/// Sole reader of the external source and sole writer of the inbound queue
///
/// Enqueueing blocks while the queue is full, which is how slow resolvers
/// push back on the source.
pub struct InboundLoop {
    source: Box<dyn MessageSource>,
    queue: mpsc::Sender<InboundMessage>,
    response_handler: Arc<dyn ResponseHandler>,
    read_error_backoff: Duration,
}

impl InboundLoop {
    pub fn new(
        source: Box<dyn MessageSource>,
        queue: mpsc::Sender<InboundMessage>,
        response_handler: Arc<dyn ResponseHandler>,
        read_error_backoff: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            response_handler,
            read_error_backoff,
        }
    }

    /// Read one message and enqueue it unmodified
    ///
    /// Only the read observes cancellation. A message that has been read is
    /// always enqueued, waiting for room if necessary, and acknowledged to the
    /// source only after that.
    pub async fn pump(&mut self, ctx: &CancellationToken) -> PumpOutcome {
        let read = tokio::select! {
            biased;
            _ = ctx.cancelled() => return PumpOutcome::Cancelled,
            read = self.source.next_message() => read,
        };

        match read {
            Ok(Some(message)) => {
                debug!(
                    key = message.key.as_deref().unwrap_or(""),
                    payload_size = message.payload.len(),
                    "Enqueueing inbound message"
                );
                if self.queue.send(message).await.is_err() {
                    return PumpOutcome::QueueClosed;
                }
                if let Err(e) = self.source.acknowledge().await {
                    self.response_handler.ack_failed(&e);
                }
                PumpOutcome::Enqueued
            }
            Ok(None) => PumpOutcome::EndOfStream,
            Err(e) => {
                self.response_handler.read_failed(&e);
                PumpOutcome::ReadFailed
            }
        }
    }

    /// Pump until the source ends, the queue closes, or `ctx` is cancelled
    ///
    /// Dropping `self` on return closes the inbound queue, which lets the
    /// resolvers drain what is left and exit.
    pub async fn run(mut self, ctx: CancellationToken) {
        info!("Inbound loop started");
        let mut enqueued: u64 = 0;

        loop {
            match self.pump(&ctx).await {
                PumpOutcome::Enqueued => enqueued += 1,
                PumpOutcome::ReadFailed => {
                    tokio::select! {
                        _ = ctx.cancelled() => {}
                        _ = tokio::time::sleep(self.read_error_backoff) => {}
                    }
                }
                PumpOutcome::EndOfStream => {
                    info!(enqueued, "Message source reached end of stream");
                    break;
                }
                PumpOutcome::QueueClosed => {
                    warn!(enqueued, "Inbound queue closed, stopping inbound loop");
                    break;
                }
                PumpOutcome::Cancelled => {
                    info!(enqueued, "Inbound loop cancelled");
                    break;
                }
            }
        }
    }
}
