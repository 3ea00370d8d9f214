use crate::domain::device::{
    CreateDeviceAssignmentInput, Device, DeviceAssignment, GetDeviceByTokenInput,
    ListActiveDeviceAssignmentsInput,
};
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Reference data provider for devices and their assignments
///
/// Implementations must be safe to call concurrently from every resolver
/// in the pool; callers add no locking of their own.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceManagement: Send + Sync {
    /// Look up a device by token
    async fn device_by_token(&self, input: GetDeviceByTokenInput) -> DomainResult<Option<Device>>;

    /// List the assignments currently active for a device
    async fn active_device_assignments_for_device(
        &self,
        input: ListActiveDeviceAssignmentsInput,
    ) -> DomainResult<Vec<DeviceAssignment>>;

    /// Create a new device assignment
    ///
    /// # Returns
    /// The persisted assignment with all reference ids resolved
    async fn create_device_assignment(
        &self,
        input: CreateDeviceAssignmentInput,
    ) -> DomainResult<DeviceAssignment>;
}
