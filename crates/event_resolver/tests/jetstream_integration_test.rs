#![cfg(feature = "integration-tests")]

use async_nats::jetstream::consumer::pull::Config as PullConfig;
use bytes::Bytes;
use chrono::Utc;
use common::domain::{EventType, UnresolvedEvent, UnresolvedEventPayload, UnresolvedLocation};
use common::nats::{
    ensure_stream, JetStreamConsumer, JetStreamPublisher, NatsClient, PullConsumer, PulledMessage,
};
use common::proto::ProtobufEventCodec;
use event_resolver::domain::{
    DeviceManagementSeed, InMemoryDeviceManagement, SeedAssignment, SeedEntity,
};
use event_resolver::nats::{JetStreamMessageSource, JetStreamMessageWriter};
use event_resolver::pipeline::{
    LoggingResponseHandler, PipelineComponents, PipelineConfig, PipelineSupervisor,
    WriterInvalidMessageSink,
};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::info;

const INBOUND_STREAM: &str = "test_inbound_events";
const RESOLVED_STREAM: &str = "test_resolved_events";
const FAILED_STREAM: &str = "test_failed_events";
const INVALID_STREAM: &str = "test_invalid_events";

struct TestEnvironment {
    _nats_container: ContainerAsync<GenericImage>,
    nats_client: NatsClient,
}

async fn setup_test_env() -> TestEnvironment {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();

    // Start NATS container with JetStream enabled
    let nats_container = GenericImage::new("nats", "latest")
        .with_exposed_port(4222.into())
        .with_cmd(["-js"])
        .start()
        .await
        .unwrap();

    let nats_host = nats_container.get_host().await.unwrap();
    let nats_port = nats_container.get_host_port_ipv4(4222).await.unwrap();
    let nats_url = format!("nats://{}:{}", nats_host, nats_port);
    info!("NATS started at {}", nats_url);

    let nats_client = NatsClient::connect(&nats_url, Duration::from_secs(10))
        .await
        .expect("Failed to connect to NATS");

    let publisher = nats_client.create_publisher_client();
    for stream in [INBOUND_STREAM, RESOLVED_STREAM, FAILED_STREAM, INVALID_STREAM] {
        ensure_stream(publisher.as_ref(), stream, "integration test stream")
            .await
            .expect("Failed to ensure stream");
    }

    TestEnvironment {
        _nats_container: nats_container,
        nats_client,
    }
}

fn reference_data() -> InMemoryDeviceManagement {
    InMemoryDeviceManagement::from_seed(DeviceManagementSeed {
        devices: vec![SeedEntity {
            id: 42,
            token: "TEST-123".to_string(),
        }],
        device_groups: vec![SeedEntity {
            id: 2,
            token: "Primary".to_string(),
        }],
        assignments: vec![SeedAssignment {
            token: "assignment-1".to_string(),
            device: "TEST-123".to_string(),
            device_group: Some("Primary".to_string()),
            asset: None,
            asset_group: None,
            customer: None,
            customer_group: None,
            area: None,
            area_group: None,
            active: true,
        }],
        ..Default::default()
    })
    .unwrap()
}

fn location_event(device_token: &str) -> Bytes {
    let now = Utc::now();
    let event = UnresolvedEvent {
        source_id: "mqtt".to_string(),
        alt_id: None,
        device_token: device_token.to_string(),
        event_type: EventType::Location,
        occurred_time: now,
        processed_time: now,
        payload: UnresolvedEventPayload::Locations(vec![UnresolvedLocation {
            latitude: 33.7490,
            longitude: -84.3880,
            elevation: None,
            occurred_time: None,
        }]),
    };
    ProtobufEventCodec::new().encode_unresolved_event(&event).into()
}

/// Pull from `stream` until `expected` messages arrived or the deadline passes
async fn collect(env: &TestEnvironment, stream: &str, expected: usize) -> Vec<PulledMessage> {
    let consumer = env
        .nats_client
        .create_consumer_client()
        .create_consumer(
            PullConfig {
                durable_name: Some(format!("{}_reader", stream)),
                filter_subject: format!("{}.>", stream),
                ..Default::default()
            },
            stream,
        )
        .await
        .unwrap();

    let mut collected = Vec::new();
    let _ = timeout(Duration::from_secs(15), async {
        while collected.len() < expected {
            match consumer.fetch_messages(10, Duration::from_millis(500)).await {
                Ok(batch) => {
                    for message in &batch {
                        message.ack().await.unwrap();
                    }
                    collected.extend(batch);
                }
                Err(_) => sleep(Duration::from_millis(100)).await,
            }
        }
    })
    .await;
    collected
}

#[tokio::test]
async fn test_pipeline_routes_jetstream_messages() {
    // Arrange
    let env = setup_test_env().await;
    let publisher = env.nats_client.create_publisher_client();

    publisher
        .publish(format!("{}.mqtt", INBOUND_STREAM), location_event("TEST-123"))
        .await
        .unwrap();
    publisher
        .publish(format!("{}.mqtt", INBOUND_STREAM), location_event("MISSING"))
        .await
        .unwrap();
    publisher
        .publish(
            format!("{}.mqtt", INBOUND_STREAM),
            Bytes::from_static(&[0x0a, 0xff, 0x01]),
        )
        .await
        .unwrap();

    let source = JetStreamMessageSource::new(
        env.nats_client.create_consumer_client(),
        INBOUND_STREAM,
        "inbound-processing-test",
        &format!("{}.>", INBOUND_STREAM),
        10,
        1,
    )
    .await
    .unwrap();

    let components = PipelineComponents {
        source: Box::new(source),
        device_management: Arc::new(reference_data()),
        codec: Arc::new(ProtobufEventCodec::new()),
        resolved_writer: Arc::new(JetStreamMessageWriter::new(
            Arc::clone(&publisher),
            RESOLVED_STREAM,
        )),
        failed_writer: Arc::new(JetStreamMessageWriter::new(
            Arc::clone(&publisher),
            FAILED_STREAM,
        )),
        invalid_sink: Arc::new(WriterInvalidMessageSink::new(Arc::new(
            JetStreamMessageWriter::new(Arc::clone(&publisher), INVALID_STREAM),
        ))),
        response_handler: Arc::new(LoggingResponseHandler),
    };
    let supervisor = PipelineSupervisor::new(PipelineConfig::default(), components);
    let ctx = CancellationToken::new();
    let process = tokio::spawn(supervisor.into_runner_process()(ctx.clone()));

    // Act
    let resolved = collect(&env, RESOLVED_STREAM, 1).await;
    let failed = collect(&env, FAILED_STREAM, 1).await;
    let invalid = collect(&env, INVALID_STREAM, 1).await;
    ctx.cancel();
    let result = timeout(Duration::from_secs(10), process).await.unwrap().unwrap();

    // Assert
    assert!(result.is_ok());

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].subject, format!("{}.42", RESOLVED_STREAM));
    let event = ProtobufEventCodec::new()
        .decode_resolved_event(&resolved[0].payload)
        .unwrap();
    assert_eq!(event.device_group_id, Some(2));

    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].subject, format!("{}.3", FAILED_STREAM));

    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].subject, format!("{}.invalid", INVALID_STREAM));
    assert_eq!(invalid[0].payload, Bytes::from_static(&[0x0a, 0xff, 0x01]));
}
