//! Device models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FleetError, FleetResult};
use crate::validate::validate_status;

/// Connectivity status of a peripheral device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    /// Parse a required status field.
    ///
    /// Absence and any value other than `online`/`offline` are validation
    /// failures on the `status` field.
    pub fn from_field(raw: Option<&str>) -> FleetResult<Self> {
        match raw {
            None => Err(FleetError::validation("status", "Status required")),
            Some(s) => s.parse(),
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Online => f.write_str("online"),
            DeviceStatus::Offline => f.write_str("offline"),
        }
    }
}

impl std::str::FromStr for DeviceStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !validate_status(s) {
            return Err(FleetError::validation(
                "status",
                format!("{} is not a valid status!", s),
            ));
        }
        Ok(if s == "online" {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        })
    }
}

/// A peripheral device record.
///
/// The record's lifecycle is independent of gateway membership: removing a
/// device from a gateway leaves the record in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Immutable identifier assigned at creation
    pub id: Uuid,
    /// Client-supplied identifier (not guaranteed unique)
    pub uid: String,
    /// Vendor name
    pub vendor: String,
    /// Current status
    pub status: DeviceStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Create a new device record with a fresh identifier
    pub fn new(uid: impl Into<String>, vendor: impl Into<String>, status: DeviceStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            uid: uid.into(),
            vendor: vendor.into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a new record from client input, validating it first
    pub fn from_input(input: &DeviceInput) -> FleetResult<Self> {
        let status = input.status()?;
        Ok(Self::new(input.uid.clone(), input.vendor.clone(), status))
    }

    /// Overwrite `uid`, `vendor` and `status` from client input.
    ///
    /// Nothing is modified if the input fails validation.
    pub fn apply(&mut self, input: &DeviceInput) -> FleetResult<()> {
        let status = input.status()?;
        self.uid = input.uid.clone();
        self.vendor = input.vendor.clone();
        self.status = status;
        Ok(())
    }
}

/// Client-supplied device fields, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInput {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DeviceInput {
    pub fn new(uid: impl Into<String>, vendor: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            vendor: vendor.into(),
            status: Some(status.into()),
        }
    }

    /// Parsed status, or the `status` validation failure
    pub fn status(&self) -> FleetResult<DeviceStatus> {
        DeviceStatus::from_field(self.status.as_deref())
    }
}

/// One entry of a bulk device request.
///
/// An entry carrying an identifier is an update intent; one without is a
/// create intent. `_id` is accepted as an alias for `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: DeviceInput,
}

impl DeviceDescriptor {
    /// A create intent
    pub fn create(input: DeviceInput) -> Self {
        Self {
            id: None,
            fields: input,
        }
    }

    /// An update intent for an existing device
    pub fn update(id: Uuid, input: DeviceInput) -> Self {
        Self {
            id: Some(id),
            fields: input,
        }
    }
}

/// Bulk reconcile request body: `{"devices": [...]}`.
///
/// `devices` is required; only an explicit `[]` clears the membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub devices: Vec<DeviceDescriptor>,
}
