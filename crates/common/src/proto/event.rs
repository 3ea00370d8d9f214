use crate::domain::{
    AlertLevel, DomainError, DomainResult, EventType, FailedEvent, FailureReason, Measurement,
    NewAssignmentPayload, ResolvedAlert, ResolvedEvent, ResolvedEventPayload, ResolvedLocation,
    ResolvedMeasurement, ResolvedNewAssignment, UnresolvedAlert, UnresolvedEvent,
    UnresolvedEventPayload, UnresolvedLocation, UnresolvedMeasurements,
};
use crate::proto::messages::{
    resolved_event_message, unresolved_event_message, AlertLevelKind, AlertMessage,
    AlertsMessage, EventKind, FailedEventMessage, FailureReasonKind, LocationMessage,
    LocationsMessage, MeasurementEntryMessage, MeasurementMessage, MeasurementsMessage,
    NewAssignmentMessage, ResolvedEventMessage, ResolvedMeasurementsMessage,
    ResolvedNewAssignmentMessage, UnresolvedEventMessage,
};
use chrono::{DateTime, Utc};
use prost_types::Timestamp;

/// Convert protobuf UnresolvedEvent to domain UnresolvedEvent
pub fn unresolved_event_proto_to_domain(proto: UnresolvedEventMessage) -> DomainResult<UnresolvedEvent> {
    let event_type = event_kind_to_domain(proto.event_type)?;

    let occurred_time = timestamp_to_datetime(
        proto
            .occurred_time
            .ok_or_else(|| DomainError::DecodeError("Missing occurred_time timestamp".to_string()))?,
    )?;

    // Events stamped by older sources may lack a processed time
    let processed_time = match proto.processed_time {
        Some(ts) => timestamp_to_datetime(ts)?,
        None => Utc::now(),
    };

    let payload = match proto.payload {
        Some(unresolved_event_message::Payload::NewAssignment(msg)) => {
            UnresolvedEventPayload::NewAssignment(NewAssignmentPayload {
                device_group_token: msg.device_group,
                asset_token: msg.asset,
                asset_group_token: msg.asset_group,
                customer_token: msg.customer,
                customer_group_token: msg.customer_group,
                area_token: msg.area,
                area_group_token: msg.area_group,
            })
        }
        Some(unresolved_event_message::Payload::Locations(msg)) => UnresolvedEventPayload::Locations(
            msg.entries
                .into_iter()
                .map(|entry| {
                    Ok(UnresolvedLocation {
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                        elevation: entry.elevation,
                        occurred_time: optional_timestamp_to_datetime(entry.occurred_time)?,
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?,
        ),
        Some(unresolved_event_message::Payload::Measurements(msg)) => {
            UnresolvedEventPayload::Measurements(
                msg.entries
                    .into_iter()
                    .map(|entry| {
                        Ok(UnresolvedMeasurements {
                            occurred_time: optional_timestamp_to_datetime(entry.occurred_time)?,
                            measurements: entry
                                .measurements
                                .into_iter()
                                .map(|m| Measurement {
                                    name: m.name,
                                    value: m.value,
                                    classifier: m.classifier,
                                })
                                .collect(),
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?,
            )
        }
        Some(unresolved_event_message::Payload::Alerts(msg)) => UnresolvedEventPayload::Alerts(
            msg.entries
                .into_iter()
                .map(|entry| {
                    Ok(UnresolvedAlert {
                        level: alert_level_to_domain(entry.level)?,
                        alert_type: entry.alert_type,
                        message: entry.message,
                        source: entry.source,
                        occurred_time: optional_timestamp_to_datetime(entry.occurred_time)?,
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?,
        ),
        None => UnresolvedEventPayload::Empty,
    };

    Ok(UnresolvedEvent {
        source_id: proto.source_id,
        alt_id: proto.alt_id,
        device_token: proto.device_token,
        event_type,
        occurred_time,
        processed_time,
        payload,
    })
}

/// Convert domain UnresolvedEvent to protobuf UnresolvedEvent
pub fn unresolved_event_domain_to_proto(event: &UnresolvedEvent) -> UnresolvedEventMessage {
    let payload = match &event.payload {
        UnresolvedEventPayload::NewAssignment(p) => Some(
            unresolved_event_message::Payload::NewAssignment(NewAssignmentMessage {
                device_group: p.device_group_token.clone(),
                asset: p.asset_token.clone(),
                asset_group: p.asset_group_token.clone(),
                customer: p.customer_token.clone(),
                customer_group: p.customer_group_token.clone(),
                area: p.area_token.clone(),
                area_group: p.area_group_token.clone(),
            }),
        ),
        UnresolvedEventPayload::Locations(entries) => {
            Some(unresolved_event_message::Payload::Locations(LocationsMessage {
                entries: entries
                    .iter()
                    .map(|entry| LocationMessage {
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                        elevation: entry.elevation,
                        occurred_time: entry.occurred_time.as_ref().map(datetime_to_timestamp),
                    })
                    .collect(),
            }))
        }
        UnresolvedEventPayload::Measurements(entries) => Some(
            unresolved_event_message::Payload::Measurements(MeasurementsMessage {
                entries: entries
                    .iter()
                    .map(|entry| MeasurementEntryMessage {
                        occurred_time: entry.occurred_time.as_ref().map(datetime_to_timestamp),
                        measurements: entry
                            .measurements
                            .iter()
                            .map(|m| MeasurementMessage {
                                name: m.name.clone(),
                                value: m.value,
                                classifier: m.classifier.clone(),
                                occurred_time: None,
                            })
                            .collect(),
                    })
                    .collect(),
            }),
        ),
        UnresolvedEventPayload::Alerts(entries) => {
            Some(unresolved_event_message::Payload::Alerts(AlertsMessage {
                entries: entries
                    .iter()
                    .map(|entry| AlertMessage {
                        alert_type: entry.alert_type.clone(),
                        level: alert_level_to_proto(entry.level) as i32,
                        message: entry.message.clone(),
                        source: entry.source.clone(),
                        occurred_time: entry.occurred_time.as_ref().map(datetime_to_timestamp),
                    })
                    .collect(),
            }))
        }
        UnresolvedEventPayload::Empty => None,
    };

    UnresolvedEventMessage {
        source_id: event.source_id.clone(),
        alt_id: event.alt_id.clone(),
        device_token: event.device_token.clone(),
        event_type: event_type_to_proto(event.event_type) as i32,
        occurred_time: Some(datetime_to_timestamp(&event.occurred_time)),
        processed_time: Some(datetime_to_timestamp(&event.processed_time)),
        payload,
    }
}

/// Convert domain ResolvedEvent to protobuf ResolvedEvent
pub fn resolved_event_domain_to_proto(event: &ResolvedEvent) -> ResolvedEventMessage {
    let payload = match &event.payload {
        ResolvedEventPayload::NewAssignment(p) => Some(
            resolved_event_message::Payload::NewAssignment(ResolvedNewAssignmentMessage {
                device_assignment_id: p.device_assignment_id,
                device_group_id: p.device_group_id,
                asset_id: p.asset_id,
                asset_group_id: p.asset_group_id,
                customer_id: p.customer_id,
                customer_group_id: p.customer_group_id,
                area_id: p.area_id,
                area_group_id: p.area_group_id,
            }),
        ),
        ResolvedEventPayload::Locations(entries) => {
            Some(resolved_event_message::Payload::Locations(LocationsMessage {
                entries: entries
                    .iter()
                    .map(|entry| LocationMessage {
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                        elevation: entry.elevation,
                        occurred_time: Some(datetime_to_timestamp(&entry.occurred_time)),
                    })
                    .collect(),
            }))
        }
        ResolvedEventPayload::Measurements(entries) => Some(
            resolved_event_message::Payload::Measurements(ResolvedMeasurementsMessage {
                entries: entries
                    .iter()
                    .map(|entry| MeasurementMessage {
                        name: entry.name.clone(),
                        value: entry.value,
                        classifier: entry.classifier.clone(),
                        occurred_time: Some(datetime_to_timestamp(&entry.occurred_time)),
                    })
                    .collect(),
            }),
        ),
        ResolvedEventPayload::Alerts(entries) => {
            Some(resolved_event_message::Payload::Alerts(AlertsMessage {
                entries: entries
                    .iter()
                    .map(|entry| AlertMessage {
                        alert_type: entry.alert_type.clone(),
                        level: alert_level_to_proto(entry.level) as i32,
                        message: entry.message.clone(),
                        source: entry.source.clone(),
                        occurred_time: Some(datetime_to_timestamp(&entry.occurred_time)),
                    })
                    .collect(),
            }))
        }
    };

    ResolvedEventMessage {
        source_id: event.source_id.clone(),
        alt_id: event.alt_id.clone(),
        device_id: event.device_id,
        device_assignment_id: event.device_assignment_id,
        device_group_id: event.device_group_id,
        asset_id: event.asset_id,
        asset_group_id: event.asset_group_id,
        customer_id: event.customer_id,
        customer_group_id: event.customer_group_id,
        area_id: event.area_id,
        area_group_id: event.area_group_id,
        event_type: event_type_to_proto(event.event_type) as i32,
        occurred_time: Some(datetime_to_timestamp(&event.occurred_time)),
        processed_time: Some(datetime_to_timestamp(&event.processed_time)),
        payload,
    }
}

/// Convert protobuf ResolvedEvent to domain ResolvedEvent
pub fn resolved_event_proto_to_domain(proto: ResolvedEventMessage) -> DomainResult<ResolvedEvent> {
    let event_type = event_kind_to_domain(proto.event_type)?;
    let occurred_time = required_timestamp(proto.occurred_time, "occurred_time")?;
    let processed_time = required_timestamp(proto.processed_time, "processed_time")?;

    let payload = match proto.payload {
        Some(resolved_event_message::Payload::NewAssignment(msg)) => {
            ResolvedEventPayload::NewAssignment(ResolvedNewAssignment {
                device_assignment_id: msg.device_assignment_id,
                device_group_id: msg.device_group_id,
                asset_id: msg.asset_id,
                asset_group_id: msg.asset_group_id,
                customer_id: msg.customer_id,
                customer_group_id: msg.customer_group_id,
                area_id: msg.area_id,
                area_group_id: msg.area_group_id,
            })
        }
        Some(resolved_event_message::Payload::Locations(msg)) => ResolvedEventPayload::Locations(
            msg.entries
                .into_iter()
                .map(|entry| {
                    Ok(ResolvedLocation {
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                        elevation: entry.elevation,
                        occurred_time: required_timestamp(entry.occurred_time, "occurred_time")?,
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?,
        ),
        Some(resolved_event_message::Payload::Measurements(msg)) => {
            ResolvedEventPayload::Measurements(
                msg.entries
                    .into_iter()
                    .map(|entry| {
                        Ok(ResolvedMeasurement {
                            occurred_time: required_timestamp(entry.occurred_time, "occurred_time")?,
                            name: entry.name,
                            value: entry.value,
                            classifier: entry.classifier,
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?,
            )
        }
        Some(resolved_event_message::Payload::Alerts(msg)) => ResolvedEventPayload::Alerts(
            msg.entries
                .into_iter()
                .map(|entry| {
                    Ok(ResolvedAlert {
                        level: alert_level_to_domain(entry.level)?,
                        occurred_time: required_timestamp(entry.occurred_time, "occurred_time")?,
                        alert_type: entry.alert_type,
                        message: entry.message,
                        source: entry.source,
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?,
        ),
        None => {
            return Err(DomainError::DecodeError(
                "Resolved event is missing its payload".to_string(),
            ))
        }
    };

    Ok(ResolvedEvent {
        source_id: proto.source_id,
        alt_id: proto.alt_id,
        device_id: proto.device_id,
        device_assignment_id: proto.device_assignment_id,
        device_group_id: proto.device_group_id,
        asset_id: proto.asset_id,
        asset_group_id: proto.asset_group_id,
        customer_id: proto.customer_id,
        customer_group_id: proto.customer_group_id,
        area_id: proto.area_id,
        area_group_id: proto.area_group_id,
        event_type,
        occurred_time,
        processed_time,
        payload,
    })
}

/// Convert domain FailedEvent to protobuf FailedEvent
pub fn failed_event_domain_to_proto(event: &FailedEvent) -> FailedEventMessage {
    FailedEventMessage {
        reason: event.reason.code(),
        service: event.service.clone(),
        message: event.message.clone(),
        error: event.error.clone(),
        payload: event.payload.clone(),
    }
}

/// Convert protobuf FailedEvent to domain FailedEvent
pub fn failed_event_proto_to_domain(proto: FailedEventMessage) -> FailedEvent {
    // Reasons added by newer producers degrade to Unknown
    let reason = match FailureReasonKind::try_from(proto.reason) {
        Ok(kind) => FailureReason::from_code(kind as i32),
        Err(_) => FailureReason::Unknown,
    };

    FailedEvent {
        reason,
        service: proto.service,
        message: proto.message,
        error: proto.error,
        payload: proto.payload,
    }
}

fn event_kind_to_domain(value: i32) -> DomainResult<EventType> {
    match EventKind::try_from(value) {
        Ok(EventKind::NewAssignment) => Ok(EventType::NewAssignment),
        Ok(EventKind::Location) => Ok(EventType::Location),
        Ok(EventKind::Measurement) => Ok(EventType::Measurement),
        Ok(EventKind::Alert) => Ok(EventType::Alert),
        Ok(EventKind::CommandInvocation) => Ok(EventType::CommandInvocation),
        Ok(EventKind::CommandResponse) => Ok(EventType::CommandResponse),
        Ok(EventKind::StateChange) => Ok(EventType::StateChange),
        Ok(EventKind::Unspecified) => Err(DomainError::DecodeError(
            "Event type is unspecified".to_string(),
        )),
        Err(_) => Err(DomainError::DecodeError(format!(
            "Unknown event type: {}",
            value
        ))),
    }
}

fn event_type_to_proto(event_type: EventType) -> EventKind {
    match event_type {
        EventType::NewAssignment => EventKind::NewAssignment,
        EventType::Location => EventKind::Location,
        EventType::Measurement => EventKind::Measurement,
        EventType::Alert => EventKind::Alert,
        EventType::CommandInvocation => EventKind::CommandInvocation,
        EventType::CommandResponse => EventKind::CommandResponse,
        EventType::StateChange => EventKind::StateChange,
    }
}

fn alert_level_to_domain(value: i32) -> DomainResult<AlertLevel> {
    match AlertLevelKind::try_from(value) {
        Ok(AlertLevelKind::Info) => Ok(AlertLevel::Info),
        Ok(AlertLevelKind::Warning) => Ok(AlertLevel::Warning),
        Ok(AlertLevelKind::Error) => Ok(AlertLevel::Error),
        Ok(AlertLevelKind::Critical) => Ok(AlertLevel::Critical),
        Err(_) => Err(DomainError::DecodeError(format!(
            "Unknown alert level: {}",
            value
        ))),
    }
}

fn alert_level_to_proto(level: AlertLevel) -> AlertLevelKind {
    match level {
        AlertLevel::Info => AlertLevelKind::Info,
        AlertLevel::Warning => AlertLevelKind::Warning,
        AlertLevel::Error => AlertLevelKind::Error,
        AlertLevel::Critical => AlertLevelKind::Critical,
    }
}

/// Convert protobuf Timestamp to chrono DateTime
fn timestamp_to_datetime(ts: Timestamp) -> DomainResult<DateTime<Utc>> {
    DateTime::from_timestamp(ts.seconds, ts.nanos as u32).ok_or_else(|| {
        DomainError::DecodeError(format!(
            "Invalid timestamp: {} seconds, {} nanos",
            ts.seconds, ts.nanos
        ))
    })
}

fn optional_timestamp_to_datetime(ts: Option<Timestamp>) -> DomainResult<Option<DateTime<Utc>>> {
    ts.map(timestamp_to_datetime).transpose()
}

fn required_timestamp(ts: Option<Timestamp>, field: &str) -> DomainResult<DateTime<Utc>> {
    let ts = ts.ok_or_else(|| DomainError::DecodeError(format!("Missing {} timestamp", field)))?;
    timestamp_to_datetime(ts)
}

fn datetime_to_timestamp(dt: &DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location_proto() -> UnresolvedEventMessage {
        UnresolvedEventMessage {
            source_id: "mqtt-source".to_string(),
            alt_id: None,
            device_token: "TEST-123".to_string(),
            event_type: EventKind::Location as i32,
            occurred_time: Some(Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
            processed_time: Some(Timestamp {
                seconds: 1_700_000_005,
                nanos: 0,
            }),
            payload: Some(unresolved_event_message::Payload::Locations(
                LocationsMessage {
                    entries: vec![LocationMessage {
                        latitude: 33.7490,
                        longitude: -84.3880,
                        elevation: None,
                        occurred_time: None,
                    }],
                },
            )),
        }
    }

    #[test]
    fn test_unresolved_proto_to_domain_conversion() {
        let event = unresolved_event_proto_to_domain(location_proto()).unwrap();

        assert_eq!(event.device_token, "TEST-123");
        assert_eq!(event.event_type, EventType::Location);
        assert_eq!(event.occurred_time.timestamp(), 1_700_000_000);
        assert_eq!(event.processed_time.timestamp(), 1_700_000_005);
        match event.payload {
            UnresolvedEventPayload::Locations(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].latitude, 33.7490);
                assert!(entries[0].occurred_time.is_none());
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_missing_occurred_time_is_rejected() {
        let mut proto = location_proto();
        proto.occurred_time = None;

        let result = unresolved_event_proto_to_domain(proto);

        assert!(matches!(result, Err(DomainError::DecodeError(_))));
    }

    #[test]
    fn test_missing_processed_time_defaults_to_now() {
        let mut proto = location_proto();
        proto.processed_time = None;
        let before = Utc::now();

        let event = unresolved_event_proto_to_domain(proto).unwrap();

        assert!(event.processed_time >= before);
    }

    #[test]
    fn test_unspecified_event_type_is_rejected() {
        let mut proto = location_proto();
        proto.event_type = EventKind::Unspecified as i32;

        let result = unresolved_event_proto_to_domain(proto);

        assert!(matches!(result, Err(DomainError::DecodeError(_))));
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let mut proto = location_proto();
        proto.event_type = 99;

        let result = unresolved_event_proto_to_domain(proto);

        assert!(matches!(result, Err(DomainError::DecodeError(_))));
    }

    #[test]
    fn test_missing_payload_decodes_to_empty() {
        let mut proto = location_proto();
        proto.payload = None;

        let event = unresolved_event_proto_to_domain(proto).unwrap();

        assert_eq!(event.payload, UnresolvedEventPayload::Empty);
    }

    #[test]
    fn test_failed_event_with_unknown_reason_degrades() {
        let proto = FailedEventMessage {
            reason: 17,
            service: "inbound-processing".to_string(),
            message: "m".to_string(),
            error: "e".to_string(),
            payload: vec![1, 2, 3],
        };

        let failed = failed_event_proto_to_domain(proto);

        assert_eq!(failed.reason, FailureReason::Unknown);
        assert_eq!(failed.payload, vec![1, 2, 3]);
    }
}
