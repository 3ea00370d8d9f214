use anyhow::{Context, Result};
use chrono::Utc;
use common::domain::{
    AlertLevel, EventType, Measurement, UnresolvedAlert, UnresolvedEvent, UnresolvedEventPayload,
    UnresolvedLocation, UnresolvedMeasurements,
};
use common::nats::JetStreamPublisher;
use common::proto::ProtobufEventCodec;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Configuration for the inbound event demo producer
#[derive(Debug, Clone)]
pub struct DemoProducerConfig {
    pub base_subject: String,
    pub interval_ms: u64,
    pub device_token: String,
    pub source_id: String,
}

fn sample_event(config: &DemoProducerConfig, counter: u32) -> UnresolvedEvent {
    let now = Utc::now();
    let (event_type, payload) = match counter % 3 {
        0 => (
            EventType::Location,
            UnresolvedEventPayload::Locations(vec![UnresolvedLocation {
                latitude: 33.755 + f64::from(counter % 100) * 0.0001,
                longitude: -84.39,
                elevation: Some(320.0),
                occurred_time: None,
            }]),
        ),
        1 => (
            EventType::Measurement,
            UnresolvedEventPayload::Measurements(vec![UnresolvedMeasurements {
                occurred_time: None,
                measurements: vec![Measurement {
                    name: "temperature".to_string(),
                    value: 20.0 + f64::from(counter % 10),
                    classifier: None,
                }],
            }]),
        ),
        _ => (
            EventType::Alert,
            UnresolvedEventPayload::Alerts(vec![UnresolvedAlert {
                alert_type: "demo.heartbeat".to_string(),
                level: AlertLevel::Info,
                message: format!("Heartbeat {}", counter),
                source: "device".to_string(),
                occurred_time: None,
            }]),
        ),
    };

    UnresolvedEvent {
        source_id: config.source_id.clone(),
        alt_id: None,
        device_token: config.device_token.clone(),
        event_type,
        occurred_time: now,
        processed_time: now,
        payload,
    }
}

/// Publish sample location, measurement and alert events for one device
/// until `ctx` is cancelled
pub async fn run_demo_producer(
    jetstream: Arc<dyn JetStreamPublisher>,
    config: DemoProducerConfig,
    ctx: CancellationToken,
) -> Result<()> {
    info!(
        base_subject = %config.base_subject,
        interval_ms = config.interval_ms,
        device_token = %config.device_token,
        "Starting demo producer"
    );

    let codec = ProtobufEventCodec::new();
    let subject = format!("{}.{}", config.base_subject, config.source_id);
    let mut ticker = interval(Duration::from_millis(config.interval_ms));
    let mut counter: u32 = 0;

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!(published = counter, "Demo producer stopped");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let event = sample_event(&config, counter);
        let encoded = codec.encode_unresolved_event(&event);
        let size_bytes = encoded.len();

        jetstream
            .publish(subject.clone(), encoded.into())
            .await
            .context("Failed to publish demo event")?;

        info!(
            subject = %subject,
            event_type = %event.event_type,
            counter,
            size_bytes,
            "Published demo event"
        );

        counter = counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use common::domain::EventCodec;
    use common::nats::MockJetStreamPublisher;

    fn config() -> DemoProducerConfig {
        DemoProducerConfig {
            base_subject: "inbound_events".to_string(),
            interval_ms: 50,
            device_token: "TEST-123".to_string(),
            source_id: "demo".to_string(),
        }
    }

    #[test]
    fn test_sample_events_cycle_through_standard_types() {
        let config = config();

        let types: Vec<EventType> = (0..4).map(|i| sample_event(&config, i).event_type).collect();

        assert_eq!(
            types,
            vec![
                EventType::Location,
                EventType::Measurement,
                EventType::Alert,
                EventType::Location
            ]
        );
    }

    #[tokio::test]
    async fn test_demo_producer_publishes_decodable_events() {
        // Arrange
        let mut mock_jetstream = MockJetStreamPublisher::new();
        mock_jetstream
            .expect_publish()
            .withf(|subject: &String, payload: &Bytes| {
                let decoded = ProtobufEventCodec::new().decode_unresolved_event(payload);
                subject == "inbound_events.demo"
                    && matches!(decoded, Ok(event) if event.device_token == "TEST-123")
            })
            .times(1..)
            .returning(|_, _| Ok(()));
        let ctx = CancellationToken::new();

        // Act
        let jetstream = Arc::new(mock_jetstream);
        let handle = tokio::spawn(run_demo_producer(jetstream, config(), ctx.clone()));
        tokio::time::sleep(Duration::from_millis(120)).await;
        ctx.cancel();

        // Assert
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_failure_stops_the_producer() {
        let mut mock_jetstream = MockJetStreamPublisher::new();
        mock_jetstream
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("stream not found")));

        let result =
            run_demo_producer(Arc::new(mock_jetstream), config(), CancellationToken::new()).await;

        assert!(result.is_err());
    }
}
