//! Wire messages for the device event streams.
//!
//! Field tags are part of the contract with producers and downstream
//! consumers; never renumber an existing field.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventKind {
    Unspecified = 0,
    NewAssignment = 1,
    Location = 2,
    Measurement = 3,
    Alert = 4,
    CommandInvocation = 5,
    CommandResponse = 6,
    StateChange = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AlertLevelKind {
    Info = 0,
    Warning = 1,
    Error = 2,
    Critical = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FailureReasonKind {
    Unknown = 0,
    Invalid = 1,
    ApiCallFailed = 2,
    DeviceNotFound = 3,
    NoActiveDeviceAssignments = 4,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UnresolvedEventMessage {
    #[prost(string, tag = "1")]
    pub source_id: String,
    #[prost(string, optional, tag = "2")]
    pub alt_id: Option<String>,
    #[prost(string, tag = "3")]
    pub device_token: String,
    #[prost(enumeration = "EventKind", tag = "4")]
    pub event_type: i32,
    #[prost(message, optional, tag = "5")]
    pub occurred_time: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "6")]
    pub processed_time: Option<::prost_types::Timestamp>,
    #[prost(oneof = "unresolved_event_message::Payload", tags = "7, 8, 9, 10")]
    pub payload: Option<unresolved_event_message::Payload>,
}

pub mod unresolved_event_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "7")]
        NewAssignment(super::NewAssignmentMessage),
        #[prost(message, tag = "8")]
        Locations(super::LocationsMessage),
        #[prost(message, tag = "9")]
        Measurements(super::MeasurementsMessage),
        #[prost(message, tag = "10")]
        Alerts(super::AlertsMessage),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NewAssignmentMessage {
    #[prost(string, optional, tag = "1")]
    pub device_group: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub asset: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub asset_group: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub customer: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub customer_group: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub area: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub area_group: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocationsMessage {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<LocationMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocationMessage {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
    #[prost(double, optional, tag = "3")]
    pub elevation: Option<f64>,
    #[prost(message, optional, tag = "4")]
    pub occurred_time: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementsMessage {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<MeasurementEntryMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementEntryMessage {
    #[prost(message, optional, tag = "1")]
    pub occurred_time: Option<::prost_types::Timestamp>,
    #[prost(message, repeated, tag = "2")]
    pub measurements: Vec<MeasurementMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementMessage {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(string, optional, tag = "3")]
    pub classifier: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub occurred_time: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AlertsMessage {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<AlertMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AlertMessage {
    #[prost(string, tag = "1")]
    pub alert_type: String,
    #[prost(enumeration = "AlertLevelKind", tag = "2")]
    pub level: i32,
    #[prost(string, tag = "3")]
    pub message: String,
    #[prost(string, tag = "4")]
    pub source: String,
    #[prost(message, optional, tag = "5")]
    pub occurred_time: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResolvedEventMessage {
    #[prost(string, tag = "1")]
    pub source_id: String,
    #[prost(string, optional, tag = "2")]
    pub alt_id: Option<String>,
    #[prost(int64, tag = "3")]
    pub device_id: i64,
    #[prost(int64, tag = "4")]
    pub device_assignment_id: i64,
    #[prost(int64, optional, tag = "5")]
    pub device_group_id: Option<i64>,
    #[prost(int64, optional, tag = "6")]
    pub asset_id: Option<i64>,
    #[prost(int64, optional, tag = "7")]
    pub asset_group_id: Option<i64>,
    #[prost(int64, optional, tag = "8")]
    pub customer_id: Option<i64>,
    #[prost(int64, optional, tag = "9")]
    pub customer_group_id: Option<i64>,
    #[prost(int64, optional, tag = "10")]
    pub area_id: Option<i64>,
    #[prost(int64, optional, tag = "11")]
    pub area_group_id: Option<i64>,
    #[prost(enumeration = "EventKind", tag = "12")]
    pub event_type: i32,
    #[prost(message, optional, tag = "13")]
    pub occurred_time: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "14")]
    pub processed_time: Option<::prost_types::Timestamp>,
    #[prost(oneof = "resolved_event_message::Payload", tags = "15, 16, 17, 18")]
    pub payload: Option<resolved_event_message::Payload>,
}

pub mod resolved_event_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "15")]
        NewAssignment(super::ResolvedNewAssignmentMessage),
        #[prost(message, tag = "16")]
        Locations(super::LocationsMessage),
        #[prost(message, tag = "17")]
        Measurements(super::ResolvedMeasurementsMessage),
        #[prost(message, tag = "18")]
        Alerts(super::AlertsMessage),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResolvedNewAssignmentMessage {
    #[prost(int64, tag = "1")]
    pub device_assignment_id: i64,
    #[prost(int64, optional, tag = "2")]
    pub device_group_id: Option<i64>,
    #[prost(int64, optional, tag = "3")]
    pub asset_id: Option<i64>,
    #[prost(int64, optional, tag = "4")]
    pub asset_group_id: Option<i64>,
    #[prost(int64, optional, tag = "5")]
    pub customer_id: Option<i64>,
    #[prost(int64, optional, tag = "6")]
    pub customer_group_id: Option<i64>,
    #[prost(int64, optional, tag = "7")]
    pub area_id: Option<i64>,
    #[prost(int64, optional, tag = "8")]
    pub area_group_id: Option<i64>,
}

/// Flattened measurements, one entry per name per sampling instant
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResolvedMeasurementsMessage {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<MeasurementMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FailedEventMessage {
    #[prost(enumeration = "FailureReasonKind", tag = "1")]
    pub reason: i32,
    #[prost(string, tag = "2")]
    pub service: String,
    #[prost(string, tag = "3")]
    pub message: String,
    #[prost(string, tag = "4")]
    pub error: String,
    #[prost(bytes = "vec", tag = "5")]
    pub payload: Vec<u8>,
}
