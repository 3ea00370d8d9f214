use chrono::{DateTime, Utc};
use std::fmt;

/// Kind of device event carried on the inbound stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    NewAssignment,
    Location,
    Measurement,
    Alert,
    CommandInvocation,
    CommandResponse,
    StateChange,
}

impl EventType {
    /// Location, measurement and alert events resolve against every active assignment
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            EventType::Location | EventType::Measurement | EventType::Alert
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NewAssignment => "new_assignment",
            EventType::Location => "location",
            EventType::Measurement => "measurement",
            EventType::Alert => "alert",
            EventType::CommandInvocation => "command_invocation",
            EventType::CommandResponse => "command_response",
            EventType::StateChange => "state_change",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device event as decoded from the inbound stream, before device and
/// assignment context has been looked up
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedEvent {
    pub source_id: String,
    pub alt_id: Option<String>,
    pub device_token: String,
    pub event_type: EventType,
    pub occurred_time: DateTime<Utc>,
    pub processed_time: DateTime<Utc>,
    pub payload: UnresolvedEventPayload,
}

/// Type-tagged payload of an unresolved event
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedEventPayload {
    NewAssignment(NewAssignmentPayload),
    Locations(Vec<UnresolvedLocation>),
    Measurements(Vec<UnresolvedMeasurements>),
    Alerts(Vec<UnresolvedAlert>),
    Empty,
}

impl UnresolvedEventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            UnresolvedEventPayload::NewAssignment(_) => "new_assignment",
            UnresolvedEventPayload::Locations(_) => "locations",
            UnresolvedEventPayload::Measurements(_) => "measurements",
            UnresolvedEventPayload::Alerts(_) => "alerts",
            UnresolvedEventPayload::Empty => "empty",
        }
    }
}

/// Request to bind a device to its reference context, identified by tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAssignmentPayload {
    pub device_group_token: Option<String>,
    pub asset_token: Option<String>,
    pub asset_group_token: Option<String>,
    pub customer_token: Option<String>,
    pub customer_group_token: Option<String>,
    pub area_token: Option<String>,
    pub area_group_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub occurred_time: Option<DateTime<Utc>>,
}

/// One sampling instant carrying any number of named measurements
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedMeasurements {
    pub occurred_time: Option<DateTime<Utc>>,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
    pub classifier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedAlert {
    pub alert_type: String,
    pub level: AlertLevel,
    pub message: String,
    pub source: String,
    pub occurred_time: Option<DateTime<Utc>>,
}
