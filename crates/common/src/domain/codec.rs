use crate::domain::failed_event::FailedEvent;
use crate::domain::resolved_event::ResolvedEvent;
use crate::domain::result::DomainResult;
use crate::domain::unresolved_event::UnresolvedEvent;

/// Byte-level contract between the pipeline and the wire format
///
/// Implementations should:
/// - Return `DomainError::DecodeError` for bytes that cannot be decoded
/// - Return `DomainError::EncodeError` if serialization fails
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait EventCodec: Send + Sync {
    fn decode_unresolved_event(&self, bytes: &[u8]) -> DomainResult<UnresolvedEvent>;

    fn encode_resolved_event(&self, event: &ResolvedEvent) -> DomainResult<Vec<u8>>;

    fn encode_failed_event(&self, event: &FailedEvent) -> DomainResult<Vec<u8>>;
}
