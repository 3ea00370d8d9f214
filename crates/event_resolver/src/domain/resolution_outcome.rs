use common::domain::{DomainError, EventResolutionResult, FailureReason, UnresolvedEvent};

/// Terminal outcome of resolving one inbound message
///
/// Exactly one outcome is produced per message. `Invalid` is the decode
/// side channel and never becomes a typed failed event.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// One result per assignment the event was resolved against; never empty
    Resolved(Vec<EventResolutionResult>),
    Failed {
        reason: FailureReason,
        event: Box<UnresolvedEvent>,
        error: DomainError,
    },
    /// The raw bytes could not be decoded into an event
    Invalid { error: DomainError },
}

impl ResolutionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionOutcome::Resolved(_) => "resolved",
            ResolutionOutcome::Failed { .. } => "failed",
            ResolutionOutcome::Invalid { .. } => "invalid",
        }
    }
}

/// Classified failure raised while resolving a decoded event
#[derive(Debug)]
pub struct ResolutionFailure {
    pub reason: FailureReason,
    pub error: DomainError,
}

impl ResolutionFailure {
    pub fn new(reason: FailureReason, error: DomainError) -> Self {
        Self { reason, error }
    }
}
