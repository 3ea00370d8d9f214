use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default = "default_json_logs")]
    pub json_logs: bool,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream carrying unresolved events
    #[serde(default = "default_inbound_stream")]
    pub inbound_stream: String,

    /// Subject filter for the inbound consumer
    #[serde(default = "default_inbound_subject")]
    pub inbound_subject: String,

    /// Durable consumer name on the inbound stream
    #[serde(default = "default_inbound_consumer_name")]
    pub inbound_consumer_name: String,

    /// JetStream stream receiving resolved events, keyed by device id
    #[serde(default = "default_resolved_stream")]
    pub resolved_stream: String,

    /// JetStream stream receiving failed events, keyed by reason code
    #[serde(default = "default_failed_stream")]
    pub failed_stream: String,

    /// JetStream stream receiving raw bytes of undecodable messages
    #[serde(default = "default_invalid_stream")]
    pub invalid_stream: String,

    /// Batch size for consumer
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Pipeline configuration
    /// Number of concurrent resolvers
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_queue_capacity")]
    pub inbound_capacity: usize,

    #[serde(default = "default_queue_capacity")]
    pub resolved_capacity: usize,

    #[serde(default = "default_queue_capacity")]
    pub failed_capacity: usize,

    /// Pause after an inbound read error in milliseconds
    #[serde(default = "default_read_error_backoff_ms")]
    pub read_error_backoff_ms: u64,

    /// JSON file with devices, reference tokens and assignments; empty starts with no data
    #[serde(default)]
    pub device_seed_file: String,

    // Demo producer
    #[serde(default)]
    pub demo_producer_enabled: bool,

    #[serde(default = "default_demo_interval_ms")]
    pub demo_interval_ms: u64,

    #[serde(default = "default_demo_device_token")]
    pub demo_device_token: String,

    // OpenTelemetry configuration
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logs() -> bool {
    true
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_inbound_stream() -> String {
    "inbound_events".to_string()
}

fn default_inbound_subject() -> String {
    "inbound_events.>".to_string()
}

fn default_inbound_consumer_name() -> String {
    "inbound-processing".to_string()
}

fn default_resolved_stream() -> String {
    "resolved_events".to_string()
}

fn default_failed_stream() -> String {
    "failed_events".to_string()
}

fn default_invalid_stream() -> String {
    "invalid_events".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_pool_size() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    100
}

fn default_read_error_backoff_ms() -> u64 {
    1000
}

fn default_demo_interval_ms() -> u64 {
    5000
}

fn default_demo_device_token() -> String {
    "TEST-123".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "inbound-processing".to_string()
}

impl ServiceConfig {
    /// Load configuration from `INBOUND_`-prefixed environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("INBOUND"))
            .build()?
            .try_deserialize()
    }
}
