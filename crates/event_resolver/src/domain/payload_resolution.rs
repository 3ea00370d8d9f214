use chrono::{DateTime, Utc};
use common::domain::{
    DomainError, DomainResult, EventType, ResolvedAlert, ResolvedEventPayload, ResolvedLocation,
    ResolvedMeasurement, UnresolvedAlert, UnresolvedEvent, UnresolvedEventPayload,
    UnresolvedLocation, UnresolvedMeasurements,
};

/// Resolve the typed payload of a location, measurement or alert event
///
/// Entries without their own occurred time inherit the event's. The payload
/// variant must match the event type.
pub fn resolve_standard_payload(event: &UnresolvedEvent) -> DomainResult<ResolvedEventPayload> {
    match (event.event_type, &event.payload) {
        (EventType::Location, UnresolvedEventPayload::Locations(locations)) => Ok(
            ResolvedEventPayload::Locations(resolve_locations(locations, event.occurred_time)),
        ),
        (EventType::Measurement, UnresolvedEventPayload::Measurements(measurements)) => {
            Ok(ResolvedEventPayload::Measurements(resolve_measurements(
                measurements,
                event.occurred_time,
            )))
        }
        (EventType::Alert, UnresolvedEventPayload::Alerts(alerts)) => Ok(
            ResolvedEventPayload::Alerts(resolve_alerts(alerts, event.occurred_time)),
        ),
        (event_type, payload) => Err(DomainError::PayloadMismatch {
            event_type: event_type.to_string(),
            payload: payload.kind().to_string(),
        }),
    }
}

fn resolve_locations(
    locations: &[UnresolvedLocation],
    event_time: DateTime<Utc>,
) -> Vec<ResolvedLocation> {
    locations
        .iter()
        .map(|location| ResolvedLocation {
            latitude: location.latitude,
            longitude: location.longitude,
            elevation: location.elevation,
            occurred_time: location.occurred_time.unwrap_or(event_time),
        })
        .collect()
}

/// Flattens every sampling instant into one entry per named measurement
fn resolve_measurements(
    measurements: &[UnresolvedMeasurements],
    event_time: DateTime<Utc>,
) -> Vec<ResolvedMeasurement> {
    measurements
        .iter()
        .flat_map(|sample| {
            let occurred_time = sample.occurred_time.unwrap_or(event_time);
            sample
                .measurements
                .iter()
                .map(move |measurement| ResolvedMeasurement {
                    name: measurement.name.clone(),
                    value: measurement.value,
                    classifier: measurement.classifier.clone(),
                    occurred_time,
                })
        })
        .collect()
}

fn resolve_alerts(alerts: &[UnresolvedAlert], event_time: DateTime<Utc>) -> Vec<ResolvedAlert> {
    alerts
        .iter()
        .map(|alert| ResolvedAlert {
            alert_type: alert.alert_type.clone(),
            level: alert.level,
            message: alert.message.clone(),
            source: alert.source.clone(),
            occurred_time: alert.occurred_time.unwrap_or(event_time),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::domain::{AlertLevel, Measurement, NewAssignmentPayload};

    fn event(event_type: EventType, payload: UnresolvedEventPayload) -> UnresolvedEvent {
        let occurred = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        UnresolvedEvent {
            source_id: "mqtt".to_string(),
            alt_id: None,
            device_token: "TEST-123".to_string(),
            event_type,
            occurred_time: occurred,
            processed_time: occurred,
            payload,
        }
    }

    #[test]
    fn test_location_inherits_event_time() {
        let entry_time = Utc.with_ymd_and_hms(2024, 5, 1, 11, 59, 0).unwrap();
        let event = event(
            EventType::Location,
            UnresolvedEventPayload::Locations(vec![
                UnresolvedLocation {
                    latitude: 33.7490,
                    longitude: -84.3880,
                    elevation: Some(320.0),
                    occurred_time: None,
                },
                UnresolvedLocation {
                    latitude: 33.7500,
                    longitude: -84.3900,
                    elevation: None,
                    occurred_time: Some(entry_time),
                },
            ]),
        );

        let payload = resolve_standard_payload(&event).unwrap();

        let ResolvedEventPayload::Locations(locations) = payload else {
            panic!("expected locations payload");
        };
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].latitude, 33.7490);
        assert_eq!(locations[0].elevation, Some(320.0));
        assert_eq!(locations[0].occurred_time, event.occurred_time);
        assert_eq!(locations[1].occurred_time, entry_time);
    }

    #[test]
    fn test_measurements_are_flattened_per_sample() {
        let sample_time = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        let event = event(
            EventType::Measurement,
            UnresolvedEventPayload::Measurements(vec![
                UnresolvedMeasurements {
                    occurred_time: Some(sample_time),
                    measurements: vec![
                        Measurement {
                            name: "engine.temp".to_string(),
                            value: 98.5,
                            classifier: Some("celsius".to_string()),
                        },
                        Measurement {
                            name: "fuel.level".to_string(),
                            value: 0.42,
                            classifier: None,
                        },
                    ],
                },
                UnresolvedMeasurements {
                    occurred_time: None,
                    measurements: vec![Measurement {
                        name: "engine.temp".to_string(),
                        value: 99.1,
                        classifier: None,
                    }],
                },
            ]),
        );

        let payload = resolve_standard_payload(&event).unwrap();

        let ResolvedEventPayload::Measurements(measurements) = payload else {
            panic!("expected measurements payload");
        };
        let names: Vec<&str> = measurements.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["engine.temp", "fuel.level", "engine.temp"]);
        assert_eq!(measurements[0].classifier.as_deref(), Some("celsius"));
        assert_eq!(measurements[1].occurred_time, sample_time);
        assert_eq!(measurements[2].occurred_time, event.occurred_time);
    }

    #[test]
    fn test_alerts_keep_level_and_source() {
        let event = event(
            EventType::Alert,
            UnresolvedEventPayload::Alerts(vec![UnresolvedAlert {
                alert_type: "engine.overheat".to_string(),
                level: AlertLevel::Critical,
                message: "Engine temperature above threshold".to_string(),
                source: "device".to_string(),
                occurred_time: None,
            }]),
        );

        let payload = resolve_standard_payload(&event).unwrap();

        let ResolvedEventPayload::Alerts(alerts) = payload else {
            panic!("expected alerts payload");
        };
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].source, "device");
        assert_eq!(alerts[0].occurred_time, event.occurred_time);
    }

    #[test]
    fn test_mismatched_payload_is_rejected() {
        let event = event(
            EventType::Location,
            UnresolvedEventPayload::NewAssignment(NewAssignmentPayload::default()),
        );

        let result = resolve_standard_payload(&event);

        assert!(matches!(
            result,
            Err(DomainError::PayloadMismatch { ref event_type, ref payload })
                if event_type == "location" && payload == "new_assignment"
        ));
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        let event = event(EventType::Alert, UnresolvedEventPayload::Empty);

        assert!(resolve_standard_payload(&event).is_err());
    }
}
