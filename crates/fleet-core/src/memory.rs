//! In-memory store backing both repositories
//!
//! Records live in two maps guarded by async read/write locks. Each `save`
//! or `delete` takes the write lock for that single call only, so concurrent
//! requests against the same gateway resolve as last-write-wins per save.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{FleetError, FleetResult};
use crate::models::{Device, Gateway, MAX_DEVICES_PER_GATEWAY};
use crate::repository::{DeviceRepository, GatewayRepository, Repositories};
use crate::validate::Validate;

/// Serializable copy of the whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub gateways: Vec<Gateway>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl Validate for Snapshot {
    /// Every gateway passes its field checks and holds at most
    /// `MAX_DEVICES_PER_GATEWAY` distinct members.
    fn validate(&self) -> FleetResult<()> {
        for gateway in &self.gateways {
            gateway.validate()?;

            if gateway.devices.len() > MAX_DEVICES_PER_GATEWAY {
                return Err(FleetError::Storage(format!(
                    "Gateway {} has {} devices, limit is {}",
                    gateway.id,
                    gateway.devices.len(),
                    MAX_DEVICES_PER_GATEWAY
                )));
            }

            let distinct: HashSet<&Uuid> = gateway.devices.iter().collect();
            if distinct.len() != gateway.devices.len() {
                return Err(FleetError::Storage(format!(
                    "Gateway {} lists a device more than once",
                    gateway.id
                )));
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    gateways: RwLock<HashMap<Uuid, Gateway>>,
    devices: RwLock<HashMap<Uuid, Device>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a store pre-populated from a snapshot.
    ///
    /// The snapshot is checked with [`Validate`] first; nothing is loaded
    /// if any record breaks a field or membership rule.
    pub fn from_snapshot(snapshot: Snapshot) -> FleetResult<Arc<Self>> {
        snapshot.validate()?;
        let store = Self {
            gateways: RwLock::new(snapshot.gateways.into_iter().map(|g| (g.id, g)).collect()),
            devices: RwLock::new(snapshot.devices.into_iter().map(|d| (d.id, d)).collect()),
        };
        Ok(Arc::new(store))
    }

    /// Load a store from a JSON snapshot file
    pub async fn load_from_file(path: impl AsRef<Path>) -> FleetResult<Arc<Self>> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            gateways = snapshot.gateways.len(),
            devices = snapshot.devices.len(),
            "Loaded store snapshot"
        );
        Self::from_snapshot(snapshot)
    }

    /// Copy every record out of the store
    pub async fn snapshot(&self) -> Snapshot {
        let mut gateways: Vec<Gateway> = self.gateways.read().await.values().cloned().collect();
        let mut devices: Vec<Device> = self.devices.read().await.values().cloned().collect();
        gateways.sort_by_key(|g| g.created_at);
        devices.sort_by_key(|d| d.created_at);
        Snapshot { gateways, devices }
    }

    /// Replace every record with the contents of `snapshot`.
    ///
    /// The current contents are kept if the snapshot fails validation.
    pub async fn restore(&self, snapshot: Snapshot) -> FleetResult<()> {
        snapshot.validate()?;
        let mut gateways = self.gateways.write().await;
        let mut devices = self.devices.write().await;
        *gateways = snapshot.gateways.into_iter().map(|g| (g.id, g)).collect();
        *devices = snapshot.devices.into_iter().map(|d| (d.id, d)).collect();
        debug!(
            gateways = gateways.len(),
            devices = devices.len(),
            "Restored store"
        );
        Ok(())
    }

    /// Write the store to a JSON file, replacing it atomically
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> FleetResult<()> {
        let path = path.as_ref();
        let snapshot = self.snapshot().await;
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(
            path = %path.display(),
            gateways = snapshot.gateways.len(),
            devices = snapshot.devices.len(),
            "Saved store snapshot"
        );
        Ok(())
    }

    /// Repository handles sharing this store
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories::new(
            Arc::new(MemoryGateways(self.clone())),
            Arc::new(MemoryDevices(self.clone())),
        )
    }
}

/// Gateway repository view of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryGateways(pub Arc<MemoryStore>);

/// Device repository view of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryDevices(pub Arc<MemoryStore>);

#[async_trait]
impl GatewayRepository for MemoryGateways {
    async fn find_by_id(&self, id: Uuid) -> FleetResult<Gateway> {
        self.0
            .gateways
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| FleetError::GatewayNotFound(id.to_string()))
    }

    async fn find_all(&self) -> FleetResult<Vec<Gateway>> {
        let mut gateways: Vec<Gateway> = self.0.gateways.read().await.values().cloned().collect();
        gateways.sort_by_key(|g| g.created_at);
        Ok(gateways)
    }

    async fn save(&self, mut gateway: Gateway) -> FleetResult<Gateway> {
        gateway.validate()?;

        let mut gateways = self.0.gateways.write().await;
        if let Some(existing) = gateways.get(&gateway.id) {
            gateway.created_at = existing.created_at;
        }
        gateway.updated_at = Utc::now();
        debug!(gateway_id = %gateway.id, devices = gateway.devices.len(), "Saving gateway");
        gateways.insert(gateway.id, gateway.clone());
        Ok(gateway)
    }

    async fn delete(&self, id: Uuid) -> FleetResult<bool> {
        Ok(self.0.gateways.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl DeviceRepository for MemoryDevices {
    async fn find_by_id(&self, id: Uuid) -> FleetResult<Device> {
        self.0
            .devices
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| FleetError::DeviceNotFound(id.to_string()))
    }

    async fn find_all(&self) -> FleetResult<Vec<Device>> {
        let mut devices: Vec<Device> = self.0.devices.read().await.values().cloned().collect();
        devices.sort_by_key(|d| d.created_at);
        Ok(devices)
    }

    async fn save(&self, mut device: Device) -> FleetResult<Device> {
        let mut devices = self.0.devices.write().await;
        if let Some(existing) = devices.get(&device.id) {
            device.created_at = existing.created_at;
        }
        device.updated_at = Utc::now();
        debug!(device_id = %device.id, status = %device.status, "Saving device");
        devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn delete(&self, id: Uuid) -> FleetResult<bool> {
        Ok(self.0.devices.write().await.remove(&id).is_some())
    }

    async fn find_many(&self, ids: &[Uuid]) -> FleetResult<Vec<Device>> {
        let devices = self.0.devices.read().await;
        Ok(ids.iter().filter_map(|id| devices.get(id).cloned()).collect())
    }
}
