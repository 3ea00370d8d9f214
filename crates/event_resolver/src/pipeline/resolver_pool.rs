use crate::domain::{EventResolver, ResolutionOutcome};
use crate::pipeline::queue::SharedReceiver;
use crate::pipeline::traits::{InboundMessage, InvalidMessageSink};
use common::domain::{DomainError, EventResolutionResult, FailedEvent, FailureReason};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Build the failed event recorded for a message that could not be resolved
pub fn failed_event(
    service: &str,
    reason: FailureReason,
    error: &DomainError,
    payload: &[u8],
) -> FailedEvent {
    FailedEvent {
        reason,
        service: service.to_string(),
        message: reason.description().to_string(),
        error: error.to_string(),
        payload: payload.to_vec(),
    }
}

/// One resolver slot: drains the shared inbound queue one message at a time
pub struct ResolverWorker {
    id: usize,
    service_name: String,
    resolver: Arc<EventResolver>,
    inbound: SharedReceiver<InboundMessage>,
    resolved: mpsc::Sender<Vec<EventResolutionResult>>,
    failed: mpsc::Sender<FailedEvent>,
    invalid_sink: Arc<dyn InvalidMessageSink>,
}

impl ResolverWorker {
    /// Process messages until the inbound queue is closed and empty
    pub async fn run(self) {
        debug!(worker = self.id, "Resolver worker started");
        let mut processed: u64 = 0;

        while let Some(message) = self.inbound.recv().await {
            self.process(message).await;
            processed += 1;
        }

        debug!(worker = self.id, processed, "Resolver worker drained");
    }

    /// Drive one message to exactly one terminal outcome
    pub async fn process(&self, message: InboundMessage) {
        match self.resolver.resolve(&message.payload).await {
            ResolutionOutcome::Resolved(results) => {
                debug!(
                    worker = self.id,
                    result_count = results.len(),
                    "Event resolved"
                );
                if self.resolved.send(results).await.is_err() {
                    warn!(worker = self.id, "Resolved queue closed, dropping results");
                }
            }
            ResolutionOutcome::Failed {
                reason,
                event,
                error,
            } => {
                debug!(
                    worker = self.id,
                    device_token = %event.device_token,
                    reason = %reason,
                    "Event failed to resolve"
                );
                let failed = failed_event(&self.service_name, reason, &error, &message.payload);
                if self.failed.send(failed).await.is_err() {
                    warn!(worker = self.id, "Failed queue closed, dropping failed event");
                }
            }
            ResolutionOutcome::Invalid { error } => {
                self.invalid_sink.invalid_message(&message, &error).await;
            }
        }
    }
}

/// Fixed-size set of resolver workers sharing one inbound queue
pub struct ResolverPool {
    workers: Vec<ResolverWorker>,
}

impl ResolverPool {
    pub fn new(
        size: usize,
        service_name: &str,
        resolver: Arc<EventResolver>,
        inbound: SharedReceiver<InboundMessage>,
        resolved: mpsc::Sender<Vec<EventResolutionResult>>,
        failed: mpsc::Sender<FailedEvent>,
        invalid_sink: Arc<dyn InvalidMessageSink>,
    ) -> Self {
        let workers = (0..size)
            .map(|id| ResolverWorker {
                id,
                service_name: service_name.to_string(),
                resolver: Arc::clone(&resolver),
                inbound: inbound.clone(),
                resolved: resolved.clone(),
                failed: failed.clone(),
                invalid_sink: Arc::clone(&invalid_sink),
            })
            .collect();

        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Spawn every worker; each handle completes once its worker has drained
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        info!(pool_size = self.workers.len(), "Starting resolver pool");
        self.workers
            .into_iter()
            .map(|worker| {
                let span = tracing::info_span!("resolver", worker = worker.id);
                tokio::spawn(worker.run().instrument(span))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::shared_channel;
    use crate::pipeline::traits::MockInvalidMessageSink;
    use bytes::Bytes;
    use chrono::Utc;
    use common::domain::{
        Device, DeviceAssignment, EventType, MockDeviceManagement, MockEventCodec,
        UnresolvedEvent, UnresolvedEventPayload,
    };

    fn event() -> UnresolvedEvent {
        UnresolvedEvent {
            source_id: "mqtt".to_string(),
            alt_id: None,
            device_token: "TEST-123".to_string(),
            event_type: EventType::Location,
            occurred_time: Utc::now(),
            processed_time: Utc::now(),
            payload: UnresolvedEventPayload::Locations(vec![]),
        }
    }

    fn message(bytes: &'static [u8]) -> InboundMessage {
        InboundMessage {
            key: None,
            payload: Bytes::from_static(bytes),
        }
    }

    struct Channels {
        resolved: mpsc::Receiver<Vec<EventResolutionResult>>,
        failed: mpsc::Receiver<FailedEvent>,
    }

    fn pool_with(
        size: usize,
        device_management: MockDeviceManagement,
        codec: MockEventCodec,
        invalid_sink: MockInvalidMessageSink,
        inbound: SharedReceiver<InboundMessage>,
    ) -> (ResolverPool, Channels) {
        let resolver = Arc::new(EventResolver::new(
            Arc::new(device_management),
            Arc::new(codec),
        ));
        let (resolved_tx, resolved) = mpsc::channel(16);
        let (failed_tx, failed) = mpsc::channel(16);
        let pool = ResolverPool::new(
            size,
            "inbound-processing",
            resolver,
            inbound,
            resolved_tx,
            failed_tx,
            Arc::new(invalid_sink),
        );
        (pool, Channels { resolved, failed })
    }

    #[test]
    fn test_failed_event_carries_raw_payload_and_description() {
        let failed = failed_event(
            "inbound-processing",
            FailureReason::DeviceNotFound,
            &DomainError::DeviceNotFound("TEST-123".to_string()),
            &[1, 2, 3],
        );

        assert_eq!(failed.reason, FailureReason::DeviceNotFound);
        assert_eq!(failed.service, "inbound-processing");
        assert_eq!(failed.message, "Device not found for token");
        assert_eq!(failed.error, "Device not found: TEST-123");
        assert_eq!(failed.payload, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_each_message_reaches_exactly_one_outcome() {
        // Arrange
        let mut codec = MockEventCodec::new();
        codec
            .expect_decode_unresolved_event()
            .returning(|bytes| match bytes {
                b"bad" => Err(DomainError::DecodeError("bad".to_string())),
                _ => Ok(event()),
            });
        let mut device_management = MockDeviceManagement::new();
        device_management
            .expect_device_by_token()
            .returning(|_| {
                Ok(Some(Device {
                    id: 1,
                    token: "TEST-123".to_string(),
                }))
            });
        let mut calls = 0;
        device_management
            .expect_active_device_assignments_for_device()
            .returning(move |_| {
                calls += 1;
                if calls % 2 == 0 {
                    Ok(vec![])
                } else {
                    Ok(vec![DeviceAssignment {
                        id: 10,
                        token: "a-10".to_string(),
                        device_id: 1,
                        device_group_id: None,
                        asset_id: None,
                        asset_group_id: None,
                        customer_id: None,
                        customer_group_id: None,
                        area_id: None,
                        area_group_id: None,
                        active: true,
                    }])
                }
            });
        let mut invalid_sink = MockInvalidMessageSink::new();
        invalid_sink
            .expect_invalid_message()
            .withf(|message: &InboundMessage, _error: &DomainError| message.payload[..] == *b"bad")
            .times(1)
            .return_const(());

        let (inbound_tx, inbound_rx) = shared_channel(16);
        let (pool, mut channels) =
            pool_with(1, device_management, codec, invalid_sink, inbound_rx);

        // Act
        for payload in [b"ok-1".as_slice(), b"bad", b"ok-2", b"ok-3"] {
            inbound_tx
                .send(InboundMessage {
                    key: None,
                    payload: Bytes::copy_from_slice(payload),
                })
                .await
                .unwrap();
        }
        drop(inbound_tx);
        for handle in pool.spawn() {
            handle.await.unwrap();
        }

        // Assert
        let mut resolved = 0;
        while channels.resolved.try_recv().is_ok() {
            resolved += 1;
        }
        let mut failed = Vec::new();
        while let Ok(event) = channels.failed.try_recv() {
            failed.push(event);
        }
        assert_eq!(resolved, 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].reason, FailureReason::NoActiveDeviceAssignments);
        assert_eq!(failed[0].payload, b"ok-2".to_vec());
    }

    #[tokio::test]
    async fn test_workers_exit_once_queue_is_closed_and_drained() {
        let mut codec = MockEventCodec::new();
        codec
            .expect_decode_unresolved_event()
            .times(3)
            .returning(|_| Err(DomainError::DecodeError("bad".to_string())));
        let mut invalid_sink = MockInvalidMessageSink::new();
        invalid_sink
            .expect_invalid_message()
            .times(3)
            .return_const(());

        let (inbound_tx, inbound_rx) = shared_channel(8);
        let (pool, _channels) = pool_with(
            4,
            MockDeviceManagement::new(),
            codec,
            invalid_sink,
            inbound_rx,
        );
        assert_eq!(pool.size(), 4);

        for _ in 0..3 {
            inbound_tx.send(message(b"junk")).await.unwrap();
        }
        drop(inbound_tx);

        for handle in pool.spawn() {
            tokio::time::timeout(std::time::Duration::from_secs(1), handle)
                .await
                .expect("worker should exit after draining")
                .unwrap();
        }
    }
}
