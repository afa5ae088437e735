//! Repository traits - the only write path to the store
//!
//! Both repositories share one contract: lookup by id, list, save (insert or
//! overwrite, validating first) and delete. Implementations can be swapped
//! for tests or for a real database without touching the engine.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{FleetError, FleetResult};
use crate::models::{Device, Gateway};

/// CRUD over gateway records
#[async_trait]
pub trait GatewayRepository: Send + Sync {
    /// Look up a gateway, failing with `GatewayNotFound`
    async fn find_by_id(&self, id: Uuid) -> FleetResult<Gateway>;

    /// List all gateways
    async fn find_all(&self) -> FleetResult<Vec<Gateway>>;

    /// Insert or overwrite a gateway.
    ///
    /// Fails with `Validation` naming the first invalid field. `created_at`
    /// of an existing record is preserved and `updated_at` is refreshed.
    async fn save(&self, gateway: Gateway) -> FleetResult<Gateway>;

    /// Remove a gateway. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> FleetResult<bool>;
}

/// CRUD over device records
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Look up a device, failing with `DeviceNotFound`
    async fn find_by_id(&self, id: Uuid) -> FleetResult<Device>;

    /// List all devices
    async fn find_all(&self) -> FleetResult<Vec<Device>>;

    /// Insert or overwrite a device.
    ///
    /// A `Device` cannot hold an invalid status: `DeviceStatus` is parsed and
    /// checked when the record is built from client input, so there is no
    /// further field validation here.
    async fn save(&self, device: Device) -> FleetResult<Device>;

    /// Remove a device. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> FleetResult<bool>;

    /// Resolve a membership list in order, skipping identifiers with no record
    async fn find_many(&self, ids: &[Uuid]) -> FleetResult<Vec<Device>> {
        let mut devices = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find_by_id(*id).await {
                Ok(device) => devices.push(device),
                Err(FleetError::DeviceNotFound(_)) => {
                    tracing::warn!(device_id = %id, "Dangling device reference in membership");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(devices)
    }
}

/// A set of repository writes that belong together.
///
/// The engine only sees this trait, so a caller can bind it to a real
/// transaction. Without one, every `save` is durable as soon as it returns
/// and a failure part-way through leaves earlier writes in place.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn gateways(&self) -> &dyn GatewayRepository;

    fn devices(&self) -> &dyn DeviceRepository;

    /// Make the unit's writes final
    async fn commit(&self) -> FleetResult<()>;
}

/// Shared repository handles, usable directly as an auto-commit unit of work
#[derive(Clone)]
pub struct Repositories {
    pub gateways: Arc<dyn GatewayRepository>,
    pub devices: Arc<dyn DeviceRepository>,
}

impl Repositories {
    pub fn new(gateways: Arc<dyn GatewayRepository>, devices: Arc<dyn DeviceRepository>) -> Self {
        Self { gateways, devices }
    }
}

#[async_trait]
impl UnitOfWork for Repositories {
    fn gateways(&self) -> &dyn GatewayRepository {
        self.gateways.as_ref()
    }

    fn devices(&self) -> &dyn DeviceRepository {
        self.devices.as_ref()
    }

    async fn commit(&self) -> FleetResult<()> {
        Ok(())
    }
}
