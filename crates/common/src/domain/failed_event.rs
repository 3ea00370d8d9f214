use std::fmt;

/// Classification of why an event could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    Unknown,
    Invalid,
    ApiCallFailed,
    DeviceNotFound,
    NoActiveDeviceAssignments,
}

impl FailureReason {
    /// Stable numeric code, also used as the outbound partition key
    pub fn code(&self) -> i32 {
        match self {
            FailureReason::Unknown => 0,
            FailureReason::Invalid => 1,
            FailureReason::ApiCallFailed => 2,
            FailureReason::DeviceNotFound => 3,
            FailureReason::NoActiveDeviceAssignments => 4,
        }
    }

    /// Unrecognized codes map to `Unknown`
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => FailureReason::Invalid,
            2 => FailureReason::ApiCallFailed,
            3 => FailureReason::DeviceNotFound,
            4 => FailureReason::NoActiveDeviceAssignments,
            _ => FailureReason::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FailureReason::Unknown => "Unknown failure while resolving event",
            FailureReason::Invalid => "Event payload is invalid",
            FailureReason::ApiCallFailed => "Reference data call failed",
            FailureReason::DeviceNotFound => "Device not found for token",
            FailureReason::NoActiveDeviceAssignments => "Device has no active assignments",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::Unknown => "unknown",
            FailureReason::Invalid => "invalid",
            FailureReason::ApiCallFailed => "api_call_failed",
            FailureReason::DeviceNotFound => "device_not_found",
            FailureReason::NoActiveDeviceAssignments => "no_active_device_assignments",
        };
        f.write_str(name)
    }
}

/// Terminal record for an event that could not be resolved
///
/// Carries the original raw payload so downstream tooling can replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedEvent {
    pub reason: FailureReason,
    pub service: String,
    pub message: String,
    pub error: String,
    pub payload: Vec<u8>,
}
