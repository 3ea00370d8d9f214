use async_trait::async_trait;
use common::domain::{
    CreateDeviceAssignmentInput, Device, DeviceAssignment, DeviceManagement, DomainError,
    DomainResult, GetDeviceByTokenInput, ListActiveDeviceAssignmentsInput,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Kind of reference entity an assignment can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    DeviceGroup,
    Asset,
    AssetGroup,
    Customer,
    CustomerGroup,
    Area,
    AreaGroup,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::DeviceGroup => "device group",
            ReferenceKind::Asset => "asset",
            ReferenceKind::AssetGroup => "asset group",
            ReferenceKind::Customer => "customer",
            ReferenceKind::CustomerGroup => "customer group",
            ReferenceKind::Area => "area",
            ReferenceKind::AreaGroup => "area group",
        }
    }
}

/// Reference data as loaded from a JSON seed file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceManagementSeed {
    pub devices: Vec<SeedEntity>,
    pub device_groups: Vec<SeedEntity>,
    pub assets: Vec<SeedEntity>,
    pub asset_groups: Vec<SeedEntity>,
    pub customers: Vec<SeedEntity>,
    pub customer_groups: Vec<SeedEntity>,
    pub areas: Vec<SeedEntity>,
    pub area_groups: Vec<SeedEntity>,
    pub assignments: Vec<SeedAssignment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntity {
    pub id: i64,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAssignment {
    pub token: String,
    pub device: String,
    #[serde(default)]
    pub device_group: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub asset_group: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_group: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub area_group: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default)]
struct DeviceManagementState {
    devices: HashMap<String, Device>,
    references: HashMap<ReferenceKind, HashMap<String, i64>>,
    assignments: HashMap<i64, DeviceAssignment>,
    next_device_id: i64,
    next_assignment_id: i64,
}

impl DeviceManagementState {
    fn reference_id(
        &self,
        kind: ReferenceKind,
        token: &Option<String>,
    ) -> DomainResult<Option<i64>> {
        let Some(token) = token else {
            return Ok(None);
        };
        self.references
            .get(&kind)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .map(Some)
            .ok_or_else(|| DomainError::ReferenceNotFound {
                kind: kind.as_str(),
                token: token.clone(),
            })
    }

    fn create_assignment(
        &mut self,
        input: CreateDeviceAssignmentInput,
    ) -> DomainResult<DeviceAssignment> {
        if self.assignments.values().any(|a| a.token == input.token) {
            return Err(DomainError::DeviceAssignmentAlreadyExists(input.token));
        }

        let device_id = self
            .devices
            .get(&input.device_token)
            .map(|device| device.id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_token.clone()))?;

        let assignment = DeviceAssignment {
            id: self.next_assignment_id + 1,
            token: input.token.clone(),
            device_id,
            device_group_id: self
                .reference_id(ReferenceKind::DeviceGroup, &input.device_group_token)?,
            asset_id: self.reference_id(ReferenceKind::Asset, &input.asset_token)?,
            asset_group_id: self
                .reference_id(ReferenceKind::AssetGroup, &input.asset_group_token)?,
            customer_id: self.reference_id(ReferenceKind::Customer, &input.customer_token)?,
            customer_group_id: self
                .reference_id(ReferenceKind::CustomerGroup, &input.customer_group_token)?,
            area_id: self.reference_id(ReferenceKind::Area, &input.area_token)?,
            area_group_id: self
                .reference_id(ReferenceKind::AreaGroup, &input.area_group_token)?,
            active: input.active,
        };

        self.next_assignment_id = assignment.id;
        self.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }
}

/// In-memory reference data provider
///
/// Thread-safe via a tokio `RwLock`; lookups from the resolver pool take the
/// read lock, assignment creation takes the write lock.
#[derive(Clone, Default)]
pub struct InMemoryDeviceManagement {
    state: Arc<RwLock<DeviceManagementState>>,
}

impl InMemoryDeviceManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from seed data, resolving every assignment's tokens
    pub fn from_seed(seed: DeviceManagementSeed) -> DomainResult<Self> {
        let mut state = DeviceManagementState::default();

        for device in seed.devices {
            state.next_device_id = state.next_device_id.max(device.id);
            state.devices.insert(
                device.token.clone(),
                Device {
                    id: device.id,
                    token: device.token,
                },
            );
        }

        let tables = [
            (ReferenceKind::DeviceGroup, seed.device_groups),
            (ReferenceKind::Asset, seed.assets),
            (ReferenceKind::AssetGroup, seed.asset_groups),
            (ReferenceKind::Customer, seed.customers),
            (ReferenceKind::CustomerGroup, seed.customer_groups),
            (ReferenceKind::Area, seed.areas),
            (ReferenceKind::AreaGroup, seed.area_groups),
        ];
        for (kind, entities) in tables {
            let tokens = state.references.entry(kind).or_default();
            for entity in entities {
                tokens.insert(entity.token, entity.id);
            }
        }

        for assignment in seed.assignments {
            state.create_assignment(CreateDeviceAssignmentInput {
                token: assignment.token,
                device_token: assignment.device,
                device_group_token: assignment.device_group,
                asset_token: assignment.asset,
                asset_group_token: assignment.asset_group,
                customer_token: assignment.customer,
                customer_group_token: assignment.customer_group,
                area_token: assignment.area,
                area_group_token: assignment.area_group,
                active: assignment.active,
            })?;
        }

        info!(
            devices = state.devices.len(),
            assignments = state.assignments.len(),
            "Loaded device management seed data"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Load seed data from a JSON file
    pub async fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: DeviceManagementSeed = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        Ok(Self::from_seed(seed)?)
    }

    /// Register a device, allocating the next id
    pub async fn add_device(&self, token: &str) -> Device {
        let mut state = self.state.write().await;
        if let Some(device) = state.devices.get(token) {
            return device.clone();
        }
        state.next_device_id += 1;
        let device = Device {
            id: state.next_device_id,
            token: token.to_string(),
        };
        state.devices.insert(token.to_string(), device.clone());
        device
    }

    pub async fn add_reference(&self, kind: ReferenceKind, token: &str, id: i64) {
        let mut state = self.state.write().await;
        state
            .references
            .entry(kind)
            .or_default()
            .insert(token.to_string(), id);
    }

    /// Flip the active flag of an assignment; returns false if it does not exist
    pub async fn set_assignment_active(&self, assignment_id: i64, active: bool) -> bool {
        let mut state = self.state.write().await;
        match state.assignments.get_mut(&assignment_id) {
            Some(assignment) => {
                assignment.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DeviceManagement for InMemoryDeviceManagement {
    async fn device_by_token(&self, input: GetDeviceByTokenInput) -> DomainResult<Option<Device>> {
        let state = self.state.read().await;
        Ok(state.devices.get(&input.token).cloned())
    }

    async fn active_device_assignments_for_device(
        &self,
        input: ListActiveDeviceAssignmentsInput,
    ) -> DomainResult<Vec<DeviceAssignment>> {
        let state = self.state.read().await;
        let mut assignments: Vec<DeviceAssignment> = state
            .assignments
            .values()
            .filter(|a| a.device_id == input.device_id && a.active)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.id);

        debug!(
            device_id = input.device_id,
            count = assignments.len(),
            "Listed active device assignments"
        );
        Ok(assignments)
    }

    async fn create_device_assignment(
        &self,
        input: CreateDeviceAssignmentInput,
    ) -> DomainResult<DeviceAssignment> {
        let mut state = self.state.write().await;
        state.create_assignment(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "devices": [{ "id": 1, "token": "TEST-123" }, { "id": 2, "token": "TEST-456" }],
        "device_groups": [{ "id": 2, "token": "Primary" }],
        "assets": [{ "id": 3, "token": "CAR-123" }],
        "customers": [{ "id": 4, "token": "ACME" }],
        "assignments": [
            { "token": "a-1", "device": "TEST-123", "device_group": "Primary", "asset": "CAR-123" },
            { "token": "a-2", "device": "TEST-123", "customer": "ACME", "active": false }
        ]
    }"#;

    fn seeded() -> InMemoryDeviceManagement {
        let seed: DeviceManagementSeed = serde_json::from_str(SEED).unwrap();
        InMemoryDeviceManagement::from_seed(seed).unwrap()
    }

    fn assignment_input(token: &str, device_token: &str) -> CreateDeviceAssignmentInput {
        CreateDeviceAssignmentInput {
            token: token.to_string(),
            device_token: device_token.to_string(),
            device_group_token: None,
            asset_token: None,
            asset_group_token: None,
            customer_token: None,
            customer_group_token: None,
            area_token: None,
            area_group_token: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_seeded_device_is_found_by_token() {
        let provider = seeded();

        let device = provider
            .device_by_token(GetDeviceByTokenInput {
                token: "TEST-123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(device.map(|d| d.id), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let provider = seeded();

        let device = provider
            .device_by_token(GetDeviceByTokenInput {
                token: "MISSING".to_string(),
            })
            .await
            .unwrap();

        assert!(device.is_none());
    }

    #[tokio::test]
    async fn test_only_active_assignments_are_listed() {
        let provider = seeded();

        let assignments = provider
            .active_device_assignments_for_device(ListActiveDeviceAssignmentsInput { device_id: 1 })
            .await
            .unwrap();

        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].token, "a-1");
        assert_eq!(assignments[0].device_group_id, Some(2));
        assert_eq!(assignments[0].asset_id, Some(3));
    }

    #[tokio::test]
    async fn test_create_assignment_resolves_tokens_and_allocates_ids() {
        let provider = seeded();
        let mut input = assignment_input("a-3", "TEST-456");
        input.customer_token = Some("ACME".to_string());

        let created = provider.create_device_assignment(input).await.unwrap();

        assert_eq!(created.id, 3);
        assert_eq!(created.device_id, 2);
        assert_eq!(created.customer_id, Some(4));
        let listed = provider
            .active_device_assignments_for_device(ListActiveDeviceAssignmentsInput { device_id: 2 })
            .await
            .unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_create_assignment_rejects_unknown_reference() {
        let provider = seeded();
        let mut input = assignment_input("a-3", "TEST-123");
        input.area_token = Some("NOWHERE".to_string());

        let result = provider.create_device_assignment(input).await;

        assert!(matches!(
            result,
            Err(DomainError::ReferenceNotFound { kind: "area", .. })
        ));
    }

    #[tokio::test]
    async fn test_create_assignment_rejects_duplicate_token() {
        let provider = seeded();

        let result = provider
            .create_device_assignment(assignment_input("a-1", "TEST-123"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::DeviceAssignmentAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivated_assignment_is_no_longer_listed() {
        let provider = seeded();

        assert!(provider.set_assignment_active(1, false).await);

        let assignments = provider
            .active_device_assignments_for_device(ListActiveDeviceAssignmentsInput { device_id: 1 })
            .await
            .unwrap();
        assert!(assignments.is_empty());
    }

    #[tokio::test]
    async fn test_add_device_allocates_after_seeded_ids() {
        let provider = seeded();

        let device = provider.add_device("TEST-789").await;

        assert_eq!(device.id, 3);
        assert_eq!(provider.add_device("TEST-789").await, device);
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let provider = InMemoryDeviceManagement::from_json_file(file.path())
            .await
            .unwrap();

        let assignments = provider
            .active_device_assignments_for_device(ListActiveDeviceAssignmentsInput { device_id: 1 })
            .await
            .unwrap();
        assert_eq!(assignments.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_with_unknown_device_is_rejected() {
        let seed: DeviceManagementSeed = serde_json::from_str(
            r#"{ "assignments": [{ "token": "a-1", "device": "GHOST" }] }"#,
        )
        .unwrap();

        let result = InMemoryDeviceManagement::from_seed(seed);

        assert!(matches!(result, Err(DomainError::DeviceNotFound(_))));
    }
}
