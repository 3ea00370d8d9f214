use crate::domain::payload_resolution::resolve_standard_payload;
use crate::domain::resolution_outcome::{ResolutionFailure, ResolutionOutcome};
use chrono::Utc;
use common::domain::{
    CreateDeviceAssignmentInput, Device, DeviceAssignment, DeviceManagement, DomainError,
    EventCodec, EventResolutionResult, EventType, FailureReason, GetDeviceByTokenInput,
    ListActiveDeviceAssignmentsInput, NewAssignmentPayload, ResolvedEvent, ResolvedEventPayload,
    ResolvedNewAssignment, UnresolvedEvent, UnresolvedEventPayload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain service that drives one raw message to its terminal outcome
///
/// Flow:
/// 1. Decode the raw bytes into an unresolved event
/// 2. Look up the device by token
/// 3. Dispatch on event type: create an assignment for new-assignment events,
///    fan standard events out over every active assignment
///
/// Stateless apart from its collaborators, so one instance is shared by every
/// worker in the pool.
pub struct EventResolver {
    device_management: Arc<dyn DeviceManagement>,
    codec: Arc<dyn EventCodec>,
}

impl EventResolver {
    pub fn new(device_management: Arc<dyn DeviceManagement>, codec: Arc<dyn EventCodec>) -> Self {
        Self {
            device_management,
            codec,
        }
    }

    /// Decode and resolve one raw message
    pub async fn resolve(&self, payload: &[u8]) -> ResolutionOutcome {
        let event = match self.codec.decode_unresolved_event(payload) {
            Ok(event) => event,
            Err(error) => {
                debug!(
                    error = %error,
                    payload_size = payload.len(),
                    "Failed to decode unresolved event"
                );
                return ResolutionOutcome::Invalid { error };
            }
        };

        match self.resolve_event(&event).await {
            Ok(results) => ResolutionOutcome::Resolved(results),
            Err(failure) => {
                warn!(
                    device_token = %event.device_token,
                    event_type = %event.event_type,
                    reason = %failure.reason,
                    error = %failure.error,
                    "Failed to resolve event"
                );
                ResolutionOutcome::Failed {
                    reason: failure.reason,
                    event: Box::new(event),
                    error: failure.error,
                }
            }
        }
    }

    /// Resolve an already decoded event
    pub async fn resolve_event(
        &self,
        event: &UnresolvedEvent,
    ) -> Result<Vec<EventResolutionResult>, ResolutionFailure> {
        debug!(
            device_token = %event.device_token,
            event_type = %event.event_type,
            source_id = %event.source_id,
            "Resolving event"
        );

        let device = self.lookup_device(&event.device_token).await?;

        match event.event_type {
            EventType::NewAssignment => {
                let payload = match &event.payload {
                    UnresolvedEventPayload::NewAssignment(payload) => payload,
                    other => {
                        return Err(ResolutionFailure::new(
                            FailureReason::Invalid,
                            DomainError::PayloadMismatch {
                                event_type: event.event_type.to_string(),
                                payload: other.kind().to_string(),
                            },
                        ))
                    }
                };
                let result = self.resolve_new_assignment(event, device, payload).await?;
                Ok(vec![result])
            }
            event_type if event_type.is_standard() => {
                self.resolve_standard_event(event, device).await
            }
            event_type => Err(ResolutionFailure::new(
                FailureReason::Invalid,
                DomainError::UnsupportedEventType(event_type.to_string()),
            )),
        }
    }

    async fn lookup_device(&self, token: &str) -> Result<Device, ResolutionFailure> {
        match self
            .device_management
            .device_by_token(GetDeviceByTokenInput {
                token: token.to_string(),
            })
            .await
        {
            Ok(Some(device)) => Ok(device),
            Ok(None) => Err(ResolutionFailure::new(
                FailureReason::DeviceNotFound,
                DomainError::DeviceNotFound(token.to_string()),
            )),
            // A lookup error leaves the device unknown just the same
            Err(error) => Err(ResolutionFailure::new(FailureReason::DeviceNotFound, error)),
        }
    }

    async fn resolve_new_assignment(
        &self,
        event: &UnresolvedEvent,
        device: Device,
        payload: &NewAssignmentPayload,
    ) -> Result<EventResolutionResult, ResolutionFailure> {
        let input = CreateDeviceAssignmentInput {
            token: Uuid::new_v4().to_string(),
            device_token: device.token.clone(),
            device_group_token: payload.device_group_token.clone(),
            asset_token: payload.asset_token.clone(),
            asset_group_token: payload.asset_group_token.clone(),
            customer_token: payload.customer_token.clone(),
            customer_group_token: payload.customer_group_token.clone(),
            area_token: payload.area_token.clone(),
            area_group_token: payload.area_group_token.clone(),
            active: true,
        };

        let assignment = self
            .device_management
            .create_device_assignment(input)
            .await
            .map_err(|error| ResolutionFailure::new(FailureReason::ApiCallFailed, error))?;

        info!(
            device_token = %device.token,
            assignment_id = assignment.id,
            assignment_token = %assignment.token,
            "Created device assignment"
        );

        let payload = ResolvedEventPayload::NewAssignment(ResolvedNewAssignment::from(&assignment));
        Ok(merge(event, device, assignment, payload))
    }

    async fn resolve_standard_event(
        &self,
        event: &UnresolvedEvent,
        device: Device,
    ) -> Result<Vec<EventResolutionResult>, ResolutionFailure> {
        let assignments = self
            .device_management
            .active_device_assignments_for_device(ListActiveDeviceAssignmentsInput {
                device_id: device.id,
            })
            .await
            .map_err(|error| ResolutionFailure::new(FailureReason::ApiCallFailed, error))?;

        if assignments.is_empty() {
            return Err(ResolutionFailure::new(
                FailureReason::NoActiveDeviceAssignments,
                DomainError::NoActiveDeviceAssignments(device.token.clone()),
            ));
        }

        let payload = resolve_standard_payload(event)
            .map_err(|error| ResolutionFailure::new(FailureReason::Invalid, error))?;

        debug!(
            device_token = %device.token,
            assignment_count = assignments.len(),
            "Fanning event out over active assignments"
        );

        Ok(assignments
            .into_iter()
            .map(|assignment| merge(event, device.clone(), assignment, payload.clone()))
            .collect())
    }
}

/// Combine an event with the device and assignment it was resolved against
fn merge(
    event: &UnresolvedEvent,
    device: Device,
    assignment: DeviceAssignment,
    payload: ResolvedEventPayload,
) -> EventResolutionResult {
    let resolved_event = ResolvedEvent {
        source_id: event.source_id.clone(),
        alt_id: event.alt_id.clone(),
        device_id: device.id,
        device_assignment_id: assignment.id,
        device_group_id: assignment.device_group_id,
        asset_id: assignment.asset_id,
        asset_group_id: assignment.asset_group_id,
        customer_id: assignment.customer_id,
        customer_group_id: assignment.customer_group_id,
        area_id: assignment.area_id,
        area_group_id: assignment.area_group_id,
        event_type: event.event_type,
        occurred_time: event.occurred_time,
        processed_time: Utc::now(),
        payload,
    };

    EventResolutionResult {
        device,
        assignment,
        resolved_event,
    }
}
