use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("No active device assignments for device: {0}")]
    NoActiveDeviceAssignments(String),

    #[error("{kind} not found: {token}")]
    ReferenceNotFound { kind: &'static str, token: String },

    #[error("Device assignment already exists: {0}")]
    DeviceAssignmentAlreadyExists(String),

    #[error("Unexpected payload for {event_type} event: {payload}")]
    PayloadMismatch { event_type: String, payload: String },

    #[error("Unsupported event type: {0}")]
    UnsupportedEventType(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
