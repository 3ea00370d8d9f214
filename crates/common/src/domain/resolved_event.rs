use crate::domain::device::{Device, DeviceAssignment};
use crate::domain::unresolved_event::{AlertLevel, EventType};
use chrono::{DateTime, Utc};

/// Event enriched with the reference ids of the assignment it was resolved against
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub source_id: String,
    pub alt_id: Option<String>,
    pub device_id: i64,
    pub device_assignment_id: i64,
    pub device_group_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub asset_group_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub customer_group_id: Option<i64>,
    pub area_id: Option<i64>,
    pub area_group_id: Option<i64>,
    pub event_type: EventType,
    pub occurred_time: DateTime<Utc>,
    pub processed_time: DateTime<Utc>,
    pub payload: ResolvedEventPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedEventPayload {
    NewAssignment(ResolvedNewAssignment),
    Locations(Vec<ResolvedLocation>),
    Measurements(Vec<ResolvedMeasurement>),
    Alerts(Vec<ResolvedAlert>),
}

/// Reference ids of an assignment created from a new-assignment event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNewAssignment {
    pub device_assignment_id: i64,
    pub device_group_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub asset_group_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub customer_group_id: Option<i64>,
    pub area_id: Option<i64>,
    pub area_group_id: Option<i64>,
}

impl From<&DeviceAssignment> for ResolvedNewAssignment {
    fn from(assignment: &DeviceAssignment) -> Self {
        Self {
            device_assignment_id: assignment.id,
            device_group_id: assignment.device_group_id,
            asset_id: assignment.asset_id,
            asset_group_id: assignment.asset_group_id,
            customer_id: assignment.customer_id,
            customer_group_id: assignment.customer_group_id,
            area_id: assignment.area_id,
            area_group_id: assignment.area_group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub occurred_time: DateTime<Utc>,
}

/// A single named measurement; one per measurement per sampling instant
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeasurement {
    pub name: String,
    pub value: f64,
    pub classifier: Option<String>,
    pub occurred_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlert {
    pub alert_type: String,
    pub level: AlertLevel,
    pub message: String,
    pub source: String,
    pub occurred_time: DateTime<Utc>,
}

/// Everything produced by resolving one event against one assignment
#[derive(Debug, Clone, PartialEq)]
pub struct EventResolutionResult {
    pub device: Device,
    pub assignment: DeviceAssignment,
    pub resolved_event: ResolvedEvent,
}
