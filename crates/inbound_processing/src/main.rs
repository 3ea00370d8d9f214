mod config;

use common::domain::DeviceManagement;
use common::nats::{ensure_stream, NatsClient};
use common::proto::ProtobufEventCodec;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use config::ServiceConfig;
use event_resolver::domain::InMemoryDeviceManagement;
use event_resolver::nats::{
    run_demo_producer, DemoProducerConfig, JetStreamMessageSource, JetStreamMessageWriter,
};
use event_resolver::pipeline::{
    LoggingResponseHandler, PipelineComponents, PipelineConfig, PipelineSupervisor,
    WriterInvalidMessageSink,
};
use runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry (tracing + OpenTelemetry for traces and logs)
    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
        json_logs: config.json_logs,
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting inbound-processing service"
    );
    debug!("Configuration: {:?}", config);

    let nats_client = match initialize_nats(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize NATS: {:#}", e);
            std::process::exit(1);
        }
    };

    let device_management = match load_device_management(&config).await {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to load device management data: {:#}", e);
            std::process::exit(1);
        }
    };

    let supervisor = match build_pipeline(&config, &nats_client, device_management).await {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!("Failed to build inbound pipeline: {:#}", e);
            std::process::exit(1);
        }
    };

    let mut runner =
        Runner::new().with_named_process("inbound_pipeline", supervisor.into_runner_process());

    if config.demo_producer_enabled {
        let publisher = nats_client.create_publisher_client();
        let demo_config = DemoProducerConfig {
            base_subject: config.inbound_stream.clone(),
            interval_ms: config.demo_interval_ms,
            device_token: config.demo_device_token.clone(),
            source_id: "demo".to_string(),
        };
        runner = runner.with_app_process(move |ctx| run_demo_producer(publisher, demo_config, ctx));
    }

    runner = runner
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || async move {
                info!("Running cleanup tasks...");
                if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                    client.close().await;
                }

                // Shutdown telemetry and flush pending traces and logs
                shutdown_telemetry(telemetry_providers);

                info!("Cleanup complete");
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(10));
    drop(nats_client);

    // Run the service
    runner.run().await;
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<Arc<NatsClient>> {
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );

    let publisher = nats_client.create_publisher_client();
    for (stream, description) in [
        (&config.inbound_stream, "Unresolved device events"),
        (&config.resolved_stream, "Resolved device events keyed by device id"),
        (&config.failed_stream, "Failed device events keyed by reason code"),
        (&config.invalid_stream, "Undecodable inbound messages"),
    ] {
        ensure_stream(publisher.as_ref(), stream, description).await?;
    }

    Ok(nats_client)
}

async fn load_device_management(
    config: &ServiceConfig,
) -> anyhow::Result<Arc<dyn DeviceManagement>> {
    if config.device_seed_file.is_empty() {
        info!("No device seed file configured, starting with empty device management data");
        return Ok(Arc::new(InMemoryDeviceManagement::new()));
    }

    info!(path = %config.device_seed_file, "Loading device management seed data");
    let provider = InMemoryDeviceManagement::from_json_file(&config.device_seed_file).await?;
    Ok(Arc::new(provider))
}

async fn build_pipeline(
    config: &ServiceConfig,
    nats_client: &NatsClient,
    device_management: Arc<dyn DeviceManagement>,
) -> anyhow::Result<PipelineSupervisor> {
    let source = JetStreamMessageSource::new(
        nats_client.create_consumer_client(),
        &config.inbound_stream,
        &config.inbound_consumer_name,
        &config.inbound_subject,
        config.nats_batch_size,
        config.nats_batch_wait_secs,
    )
    .await?;

    let publisher = nats_client.create_publisher_client();
    let components = PipelineComponents {
        source: Box::new(source),
        device_management,
        codec: Arc::new(ProtobufEventCodec::new()),
        resolved_writer: Arc::new(JetStreamMessageWriter::new(
            Arc::clone(&publisher),
            config.resolved_stream.clone(),
        )),
        failed_writer: Arc::new(JetStreamMessageWriter::new(
            Arc::clone(&publisher),
            config.failed_stream.clone(),
        )),
        invalid_sink: Arc::new(WriterInvalidMessageSink::new(Arc::new(
            JetStreamMessageWriter::new(publisher, config.invalid_stream.clone()),
        ))),
        response_handler: Arc::new(LoggingResponseHandler),
    };

    let pipeline_config = PipelineConfig {
        service_name: config.otel_service_name.clone(),
        pool_size: config.pool_size,
        inbound_capacity: config.inbound_capacity,
        resolved_capacity: config.resolved_capacity,
        failed_capacity: config.failed_capacity,
        read_error_backoff: Duration::from_millis(config.read_error_backoff_ms),
    };
    pipeline_config.validate()?;

    Ok(PipelineSupervisor::new(pipeline_config, components))
}
