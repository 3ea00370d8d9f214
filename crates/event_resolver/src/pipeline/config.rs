use crate::pipeline::error::PipelineError;
use std::time::Duration;

/// Sizing of the resolver pool and its queues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name recorded as the originating service on failed events
    pub service_name: String,
    pub pool_size: usize,
    pub inbound_capacity: usize,
    pub resolved_capacity: usize,
    pub failed_capacity: usize,
    /// Pause after a source read error before reading again
    pub read_error_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            service_name: "inbound-processing".to_string(),
            pool_size: 5,
            inbound_capacity: 100,
            resolved_capacity: 100,
            failed_capacity: 100,
            read_error_backoff: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.pool_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        for (name, capacity) in [
            ("inbound_capacity", self.inbound_capacity),
            ("resolved_capacity", self.resolved_capacity),
            ("failed_capacity", self.failed_capacity),
        ] {
            if capacity == 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}
