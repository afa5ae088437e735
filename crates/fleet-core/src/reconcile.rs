//! Bulk device reconciliation
//!
//! Turns a gateway's current device membership into a client-supplied
//! target list.
//!
//! ```text
//! desired = []  ──────────────► clear membership, save gateway, done
//!
//! removal pass: keep members whose id appears in `desired`
//!
//! apply pass (client order):
//!   id ∈ original members ──► update record (no capacity check)
//!   id known, not a member ─┐
//!   no id ──────────────────┴► create if working set < cap, else skip
//!   id unknown to the store ─► skip
//!
//! save gateway with the working set
//! ```
//!
//! Removal only revokes membership; device records are never deleted here.
//! There is no rollback: when a device fails validation the call returns
//! the failure, device writes made earlier in the pass stay persisted and the
//! gateway's membership is left as it was.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FleetError, FleetResult};
use crate::models::{Device, DeviceDescriptor, DeviceInput, MAX_DEVICES_PER_GATEWAY};
use crate::repository::UnitOfWork;

/// What a successful reconcile did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Member records overwritten
    pub updated: usize,
    /// New records created and added to the membership
    pub created: usize,
    /// Members dropped from the membership
    pub removed: usize,
    /// Entries ignored (over capacity, or unknown identifier)
    pub skipped: usize,
    /// Final membership size
    pub members: usize,
}

/// Applies bulk device reconciliation through a [`UnitOfWork`]
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    capacity: usize,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self {
            capacity: MAX_DEVICES_PER_GATEWAY,
        }
    }
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-gateway device cap enforced on create intents
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reconcile `gateway_id`'s devices against `desired`.
    ///
    /// Fails with `GatewayNotFound` if the gateway does not exist and with
    /// `Validation` on the first device entry that does not validate.
    pub async fn reconcile(
        &self,
        uow: &dyn UnitOfWork,
        gateway_id: Uuid,
        desired: &[DeviceDescriptor],
    ) -> FleetResult<ReconcileReport> {
        let mut gateway = uow.gateways().find_by_id(gateway_id).await?;
        let current = gateway.devices.clone();
        let mut report = ReconcileReport::default();

        if desired.is_empty() {
            report.removed = current.len();
            gateway.devices.clear();
            uow.gateways().save(gateway).await?;
            info!(gateway_id = %gateway_id, removed = report.removed, "Cleared gateway devices");
            return Ok(report);
        }

        let requested: HashSet<Uuid> = desired.iter().filter_map(|d| d.id).collect();
        let mut members: Vec<Uuid> = current
            .iter()
            .copied()
            .filter(|id| requested.contains(id))
            .collect();
        report.removed = current.len() - members.len();

        for entry in desired {
            match entry.id {
                Some(id) if current.contains(&id) => {
                    self.update_member(uow, id, &entry.fields, &mut members, &mut report)
                        .await?;
                }
                Some(id) => match uow.devices().find_by_id(id).await {
                    Ok(_) => {
                        self.admit_create(uow, &entry.fields, &mut members, &mut report)
                            .await?;
                    }
                    Err(FleetError::DeviceNotFound(_)) => {
                        debug!(gateway_id = %gateway_id, device_id = %id, "Unknown device id, skipping entry");
                        report.skipped += 1;
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    self.admit_create(uow, &entry.fields, &mut members, &mut report)
                        .await?;
                }
            }
        }

        report.members = members.len();
        gateway.devices = members;
        uow.gateways().save(gateway).await?;

        info!(
            gateway_id = %gateway_id,
            updated = report.updated,
            created = report.created,
            removed = report.removed,
            skipped = report.skipped,
            members = report.members,
            "Reconciled gateway devices"
        );
        Ok(report)
    }

    async fn update_member(
        &self,
        uow: &dyn UnitOfWork,
        id: Uuid,
        fields: &DeviceInput,
        members: &mut Vec<Uuid>,
        report: &mut ReconcileReport,
    ) -> FleetResult<()> {
        let mut device = match uow.devices().find_by_id(id).await {
            Ok(device) => device,
            Err(FleetError::DeviceNotFound(_)) => {
                // Member id without a record: drop it so every member resolves.
                warn!(device_id = %id, "Member device record missing, dropping from membership");
                members.retain(|m| *m != id);
                report.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        device.apply(fields)?;
        uow.devices().save(device).await?;
        report.updated += 1;
        Ok(())
    }

    async fn admit_create(
        &self,
        uow: &dyn UnitOfWork,
        fields: &DeviceInput,
        members: &mut Vec<Uuid>,
        report: &mut ReconcileReport,
    ) -> FleetResult<()> {
        if members.len() >= self.capacity {
            debug!(uid = %fields.uid, "Gateway at capacity, skipping create");
            report.skipped += 1;
            return Ok(());
        }

        let device = uow.devices().save(Device::from_input(fields)?).await?;
        members.push(device.id);
        report.created += 1;
        Ok(())
    }
}
