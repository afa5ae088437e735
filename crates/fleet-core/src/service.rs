//! Fleet service - gateway and device operations
//!
//! Single-entity operations are lookup, validate, persist. The bulk device
//! update is delegated to the [`ReconciliationEngine`].

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{FleetError, FleetResult};
use crate::models::{
    CreateGateway, Device, DeviceDescriptor, DeviceInput, Gateway, GatewayDetail, UpdateGateway,
    MAX_DEVICES_PER_GATEWAY,
};
use crate::reconcile::{ReconcileReport, ReconciliationEngine};
use crate::repository::{Repositories, UnitOfWork};
use crate::validate::check_ip_address;

/// Service for gateway and device business logic
#[derive(Clone)]
pub struct FleetService {
    repos: Repositories,
    engine: ReconciliationEngine,
}

impl FleetService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            engine: ReconciliationEngine::new(),
        }
    }

    /// Repository handles used by this service
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    // =========================================================================
    // Gateways
    // =========================================================================

    /// List all gateways with their devices resolved
    pub async fn list_gateways(&self) -> FleetResult<Vec<GatewayDetail>> {
        let gateways = self.repos.gateways.find_all().await?;
        let mut items = Vec::with_capacity(gateways.len());
        for gateway in gateways {
            let devices = self.repos.devices.find_many(&gateway.devices).await?;
            items.push(GatewayDetail::new(gateway, devices));
        }
        Ok(items)
    }

    /// Create a gateway. A serial is generated when none is supplied.
    pub async fn create_gateway(&self, input: CreateGateway) -> FleetResult<Gateway> {
        check_ip_address(input.ip_address.as_deref())?;

        let serial = input
            .serial
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let gateway = Gateway::new(serial, input.name, input.ip_address.unwrap_or_default());
        let gateway = self.repos.gateways.save(gateway).await?;

        info!(gateway_id = %gateway.id, serial = %gateway.serial, "Gateway created");
        Ok(gateway)
    }

    /// Get a gateway by id
    pub async fn get_gateway(&self, id: Uuid) -> FleetResult<Gateway> {
        self.repos.gateways.find_by_id(id).await
    }

    /// Overwrite the supplied fields of a gateway
    pub async fn update_gateway(&self, id: Uuid, input: UpdateGateway) -> FleetResult<Gateway> {
        debug!(gateway_id = %id, "Updating gateway");
        let mut gateway = self.repos.gateways.find_by_id(id).await?;

        if let Some(ip_address) = input.ip_address {
            check_ip_address(Some(&ip_address))?;
            gateway.ip_address = ip_address;
        }
        if let Some(serial) = input.serial {
            gateway.serial = serial;
        }
        if let Some(name) = input.name {
            gateway.name = name;
        }

        let gateway = self.repos.gateways.save(gateway).await?;
        info!(gateway_id = %gateway.id, "Gateway updated");
        Ok(gateway)
    }

    /// Delete a gateway and return the removed record.
    ///
    /// Member device records are not deleted.
    pub async fn delete_gateway(&self, id: Uuid) -> FleetResult<Gateway> {
        let gateway = self.repos.gateways.find_by_id(id).await?;
        if !self.repos.gateways.delete(id).await? {
            return Err(FleetError::GatewayNotFound(id.to_string()));
        }

        info!(gateway_id = %id, orphaned_devices = gateway.devices.len(), "Gateway deleted");
        Ok(gateway)
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// List the devices of a gateway
    pub async fn list_devices(&self, gateway_id: Uuid) -> FleetResult<Vec<Device>> {
        let gateway = self.repos.gateways.find_by_id(gateway_id).await?;
        self.repos.devices.find_many(&gateway.devices).await
    }

    /// Create a device and add it to a gateway
    pub async fn create_device(&self, gateway_id: Uuid, input: DeviceInput) -> FleetResult<Device> {
        let mut gateway = self.repos.gateways.find_by_id(gateway_id).await?;
        if gateway.is_full() {
            return Err(FleetError::CapacityExceeded {
                gateway_id: gateway_id.to_string(),
                limit: MAX_DEVICES_PER_GATEWAY,
            });
        }

        let device = self.repos.devices.save(Device::from_input(&input)?).await?;
        gateway.devices.push(device.id);
        self.repos.gateways.save(gateway).await?;

        info!(gateway_id = %gateway_id, device_id = %device.id, "Device created");
        Ok(device)
    }

    /// Get a device that is a member of a gateway
    pub async fn get_device(&self, gateway_id: Uuid, device_id: Uuid) -> FleetResult<Device> {
        let gateway = self.repos.gateways.find_by_id(gateway_id).await?;
        self.member_device(&gateway, device_id).await
    }

    /// Overwrite a member device's fields
    pub async fn update_device(
        &self,
        gateway_id: Uuid,
        device_id: Uuid,
        input: DeviceInput,
    ) -> FleetResult<Device> {
        let gateway = self.repos.gateways.find_by_id(gateway_id).await?;
        let mut device = self.member_device(&gateway, device_id).await?;

        device.apply(&input)?;
        let device = self.repos.devices.save(device).await?;

        info!(gateway_id = %gateway_id, device_id = %device_id, status = %device.status, "Device updated");
        Ok(device)
    }

    /// Remove a device from a gateway and delete its record
    pub async fn delete_device(&self, gateway_id: Uuid, device_id: Uuid) -> FleetResult<()> {
        let mut gateway = self.repos.gateways.find_by_id(gateway_id).await?;
        if !gateway.has_device(&device_id) {
            return Err(FleetError::DeviceNotFound(device_id.to_string()));
        }

        gateway.devices.retain(|id| *id != device_id);
        self.repos.gateways.save(gateway).await?;
        self.repos.devices.delete(device_id).await?;

        info!(gateway_id = %gateway_id, device_id = %device_id, "Device deleted");
        Ok(())
    }

    /// Bulk-reconcile a gateway's devices against `desired`
    pub async fn reconcile_devices(
        &self,
        gateway_id: Uuid,
        desired: &[DeviceDescriptor],
    ) -> FleetResult<ReconcileReport> {
        let uow: &dyn UnitOfWork = &self.repos;
        let report = self.engine.reconcile(uow, gateway_id, desired).await?;
        uow.commit().await?;
        Ok(report)
    }

    async fn member_device(&self, gateway: &Gateway, device_id: Uuid) -> FleetResult<Device> {
        if !gateway.has_device(&device_id) {
            return Err(FleetError::DeviceNotFound(device_id.to_string()));
        }
        self.repos.devices.find_by_id(device_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::DeviceStatus;

    fn service() -> FleetService {
        FleetService::new(MemoryStore::new().repositories())
    }

    async fn gateway(service: &FleetService) -> Gateway {
        service
            .create_gateway(CreateGateway {
                serial: None,
                name: "Main".into(),
                ip_address: Some("192.168.0.1".into()),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_gateway_generates_serial() {
        let service = service();
        let gateway = gateway(&service).await;
        assert!(Uuid::parse_str(&gateway.serial).is_ok());
        assert!(gateway.devices.is_empty());
    }

    #[tokio::test]
    async fn test_create_gateway_keeps_supplied_serial() {
        let service = service();
        let gateway = service
            .create_gateway(CreateGateway {
                serial: Some("GW-001".into()),
                name: "Main".into(),
                ip_address: Some("10.0.0.1".into()),
            })
            .await
            .unwrap();
        assert_eq!(gateway.serial, "GW-001");
    }

    #[tokio::test]
    async fn test_create_gateway_rejects_bad_ip() {
        let service = service();
        let err = service
            .create_gateway(CreateGateway {
                serial: None,
                name: "Main".into(),
                ip_address: Some("999.1.1.1".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("ip_address"));
        assert!(err.to_string().contains("999.1.1.1"));
        assert!(service.list_gateways().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_gateway_requires_ip() {
        let err = service()
            .create_gateway(CreateGateway::default())
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("ip_address"));
    }

    #[tokio::test]
    async fn test_update_gateway_partial() {
        let service = service();
        let gateway = gateway(&service).await;

        let updated = service
            .update_gateway(
                gateway.id,
                UpdateGateway {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.ip_address, "192.168.0.1");
        assert_eq!(updated.serial, gateway.serial);

        let err = service
            .update_gateway(
                gateway.id,
                UpdateGateway {
                    ip_address: Some("1.2.3".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("ip_address"));
        assert_eq!(
            service.get_gateway(gateway.id).await.unwrap().ip_address,
            "192.168.0.1"
        );
    }

    #[tokio::test]
    async fn test_delete_gateway_keeps_devices() {
        let service = service();
        let gateway = gateway(&service).await;
        let device = service
            .create_device(gateway.id, DeviceInput::new("a", "acme", "online"))
            .await
            .unwrap();

        let removed = service.delete_gateway(gateway.id).await.unwrap();
        assert_eq!(removed.devices, vec![device.id]);
        assert!(matches!(
            service.get_gateway(gateway.id).await,
            Err(FleetError::GatewayNotFound(_))
        ));
        assert!(service
            .repositories()
            .devices
            .find_by_id(device.id)
            .await
            .is_ok());

        assert!(matches!(
            service.delete_gateway(gateway.id).await,
            Err(FleetError::GatewayNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_gateways_resolves_devices() {
        let service = service();
        let gateway = gateway(&service).await;
        service
            .create_device(gateway.id, DeviceInput::new("a", "acme", "online"))
            .await
            .unwrap();

        let items = service.list_gateways().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].devices.len(), 1);
        assert_eq!(items[0].devices[0].uid, "a");
    }

    #[tokio::test]
    async fn test_create_device_capacity() {
        let service = service();
        let gateway = gateway(&service).await;
        for i in 0..MAX_DEVICES_PER_GATEWAY {
            service
                .create_device(gateway.id, DeviceInput::new(format!("d{}", i), "acme", "online"))
                .await
                .unwrap();
        }

        let err = service
            .create_device(gateway.id, DeviceInput::new("one-too-many", "acme", "online"))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::CapacityExceeded { limit: 10, .. }));
        assert_eq!(
            service.list_devices(gateway.id).await.unwrap().len(),
            MAX_DEVICES_PER_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_create_device_rejects_bad_status() {
        let service = service();
        let gateway = gateway(&service).await;
        let err = service
            .create_device(gateway.id, DeviceInput::new("a", "acme", "paused"))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("status"));
        assert!(service.list_devices(gateway.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_operations_require_membership() {
        let service = service();
        let first = gateway(&service).await;
        let second = gateway(&service).await;
        let device = service
            .create_device(first.id, DeviceInput::new("a", "acme", "online"))
            .await
            .unwrap();

        assert!(matches!(
            service.get_device(second.id, device.id).await,
            Err(FleetError::DeviceNotFound(_))
        ));
        assert!(matches!(
            service
                .update_device(second.id, device.id, DeviceInput::new("a", "acme", "offline"))
                .await,
            Err(FleetError::DeviceNotFound(_))
        ));
        assert!(matches!(
            service.delete_device(second.id, device.id).await,
            Err(FleetError::DeviceNotFound(_))
        ));
        assert_eq!(service.get_device(first.id, device.id).await.unwrap().uid, "a");
    }

    #[tokio::test]
    async fn test_update_device() {
        let service = service();
        let gateway = gateway(&service).await;
        let device = service
            .create_device(gateway.id, DeviceInput::new("a", "acme", "online"))
            .await
            .unwrap();

        let updated = service
            .update_device(gateway.id, device.id, DeviceInput::new("b", "globex", "offline"))
            .await
            .unwrap();
        assert_eq!(updated.id, device.id);
        assert_eq!(updated.uid, "b");
        assert_eq!(updated.status, DeviceStatus::Offline);
    }

    #[tokio::test]
    async fn test_delete_device_removes_record() {
        let service = service();
        let gateway = gateway(&service).await;
        let device = service
            .create_device(gateway.id, DeviceInput::new("a", "acme", "online"))
            .await
            .unwrap();

        service.delete_device(gateway.id, device.id).await.unwrap();
        assert!(service.list_devices(gateway.id).await.unwrap().is_empty());
        assert!(matches!(
            service.repositories().devices.find_by_id(device.id).await,
            Err(FleetError::DeviceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reconcile_devices_through_service() {
        let service = service();
        let gateway = gateway(&service).await;
        let report = service
            .reconcile_devices(
                gateway.id,
                &[DeviceDescriptor::create(DeviceInput::new("a", "acme", "online"))],
            )
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(service.list_devices(gateway.id).await.unwrap().len(), 1);
    }
}
