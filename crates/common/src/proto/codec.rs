use crate::domain::{
    DomainError, DomainResult, EventCodec, FailedEvent, ResolvedEvent, UnresolvedEvent,
};
use crate::proto::event::{
    failed_event_domain_to_proto, failed_event_proto_to_domain, resolved_event_domain_to_proto,
    resolved_event_proto_to_domain, unresolved_event_domain_to_proto,
    unresolved_event_proto_to_domain,
};
use crate::proto::messages::{FailedEventMessage, ResolvedEventMessage, UnresolvedEventMessage};
use prost::Message;

/// Protobuf implementation of the event codec
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufEventCodec;

impl ProtobufEventCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode an unresolved event, as an event source would
    pub fn encode_unresolved_event(&self, event: &UnresolvedEvent) -> Vec<u8> {
        unresolved_event_domain_to_proto(event).encode_to_vec()
    }

    pub fn decode_resolved_event(&self, bytes: &[u8]) -> DomainResult<ResolvedEvent> {
        let proto = ResolvedEventMessage::decode(bytes)
            .map_err(|e| DomainError::DecodeError(format!("Invalid ResolvedEvent: {}", e)))?;
        resolved_event_proto_to_domain(proto)
    }

    pub fn decode_failed_event(&self, bytes: &[u8]) -> DomainResult<FailedEvent> {
        let proto = FailedEventMessage::decode(bytes)
            .map_err(|e| DomainError::DecodeError(format!("Invalid FailedEvent: {}", e)))?;
        Ok(failed_event_proto_to_domain(proto))
    }
}

impl EventCodec for ProtobufEventCodec {
    fn decode_unresolved_event(&self, bytes: &[u8]) -> DomainResult<UnresolvedEvent> {
        let proto = UnresolvedEventMessage::decode(bytes)
            .map_err(|e| DomainError::DecodeError(format!("Invalid UnresolvedEvent: {}", e)))?;
        unresolved_event_proto_to_domain(proto)
    }

    fn encode_resolved_event(&self, event: &ResolvedEvent) -> DomainResult<Vec<u8>> {
        Ok(resolved_event_domain_to_proto(event).encode_to_vec())
    }

    fn encode_failed_event(&self, event: &FailedEvent) -> DomainResult<Vec<u8>> {
        Ok(failed_event_domain_to_proto(event).encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EventType, FailureReason, Measurement, ResolvedEventPayload, ResolvedMeasurement,
        UnresolvedEventPayload, UnresolvedMeasurements,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let codec = ProtobufEventCodec::new();

        let result = codec.decode_unresolved_event(&[0xff, 0xff, 0xff, 0x01]);

        assert!(matches!(result, Err(DomainError::DecodeError(_))));
    }

    #[test]
    fn test_unresolved_measurements_survive_the_wire() {
        let codec = ProtobufEventCodec::new();
        let occurred = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = UnresolvedEvent {
            source_id: "coap".to_string(),
            alt_id: Some("alt-1".to_string()),
            device_token: "TEST-123".to_string(),
            event_type: EventType::Measurement,
            occurred_time: occurred,
            processed_time: occurred,
            payload: UnresolvedEventPayload::Measurements(vec![UnresolvedMeasurements {
                occurred_time: None,
                measurements: vec![Measurement {
                    name: "engine.temp".to_string(),
                    value: 98.5,
                    classifier: Some("celsius".to_string()),
                }],
            }]),
        };

        let bytes = codec.encode_unresolved_event(&event);
        let decoded = codec.decode_unresolved_event(&bytes).unwrap();

        assert_eq!(decoded, event);
    }

    #[test]
    fn test_resolved_event_keeps_reference_ids() {
        let codec = ProtobufEventCodec::new();
        let occurred = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = ResolvedEvent {
            source_id: "coap".to_string(),
            alt_id: None,
            device_id: 1,
            device_assignment_id: 10,
            device_group_id: Some(2),
            asset_id: Some(3),
            asset_group_id: None,
            customer_id: None,
            customer_group_id: None,
            area_id: Some(9),
            area_group_id: None,
            event_type: EventType::Measurement,
            occurred_time: occurred,
            processed_time: occurred,
            payload: ResolvedEventPayload::Measurements(vec![ResolvedMeasurement {
                name: "engine.temp".to_string(),
                value: 98.5,
                classifier: None,
                occurred_time: occurred,
            }]),
        };

        let bytes = codec.encode_resolved_event(&event).unwrap();
        let decoded = codec.decode_resolved_event(&bytes).unwrap();

        assert_eq!(decoded.device_group_id, Some(2));
        assert_eq!(decoded.asset_id, Some(3));
        assert_eq!(decoded.area_id, Some(9));
        assert_eq!(decoded.customer_id, None);
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_failed_event_keeps_raw_payload() {
        let codec = ProtobufEventCodec::new();
        let failed = FailedEvent {
            reason: FailureReason::NoActiveDeviceAssignments,
            service: "inbound-processing".to_string(),
            message: "Device has no active assignments".to_string(),
            error: "No active device assignments for device: TEST-123".to_string(),
            payload: vec![0x0a, 0x03, 0x61, 0x62, 0x63],
        };

        let bytes = codec.encode_failed_event(&failed).unwrap();
        let decoded = codec.decode_failed_event(&bytes).unwrap();

        assert_eq!(decoded, failed);
    }
}
