/// Domain representation of a Device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: i64,
    pub token: String,
}

/// Binding of a device to the reference context its events belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAssignment {
    pub id: i64,
    pub token: String,
    pub device_id: i64,
    pub device_group_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub asset_group_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub customer_group_id: Option<i64>,
    pub area_id: Option<i64>,
    pub area_group_id: Option<i64>,
    pub active: bool,
}

/// Input for looking up a device by its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceByTokenInput {
    pub token: String,
}

/// Input for listing the active assignments of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListActiveDeviceAssignmentsInput {
    pub device_id: i64,
}

/// Input for creating a device assignment
/// Reference context is supplied as tokens and resolved by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeviceAssignmentInput {
    pub token: String,
    pub device_token: String,
    pub device_group_token: Option<String>,
    pub asset_token: Option<String>,
    pub asset_group_token: Option<String>,
    pub customer_token: Option<String>,
    pub customer_group_token: Option<String>,
    pub area_token: Option<String>,
    pub area_group_token: Option<String>,
    pub active: bool,
}
