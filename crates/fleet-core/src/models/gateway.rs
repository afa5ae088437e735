//! Gateway models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Device;
use crate::error::FleetResult;
use crate::validate::{check_ip_address, Validate};

/// Maximum number of devices a gateway may own
pub const MAX_DEVICES_PER_GATEWAY: usize = 10;

/// A managed network gateway.
///
/// `devices` is the gateway's membership list: identifiers of the Device
/// records it currently claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    /// Immutable identifier assigned at creation
    pub id: Uuid,
    /// Unique serial token
    pub serial: String,
    /// Free-text name
    pub name: String,
    /// IPv4 address in dotted-quad form
    pub ip_address: String,
    /// Member device identifiers
    #[serde(default)]
    pub devices: Vec<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Gateway {
    /// Create a new gateway with no devices and a fresh identifier
    pub fn new(
        serial: impl Into<String>,
        name: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            serial: serial.into(),
            name: name.into(),
            ip_address: ip_address.into(),
            devices: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `device_id` is a member of this gateway
    pub fn has_device(&self, device_id: &Uuid) -> bool {
        self.devices.contains(device_id)
    }

    /// Whether the gateway is at the device cap
    pub fn is_full(&self) -> bool {
        self.devices.len() >= MAX_DEVICES_PER_GATEWAY
    }
}

impl Validate for Gateway {
    fn validate(&self) -> FleetResult<()> {
        check_ip_address(Some(&self.ip_address))
    }
}

/// Gateway with its membership resolved to device records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDetail {
    pub id: Uuid,
    pub serial: String,
    pub name: String,
    pub ip_address: String,
    pub devices: Vec<Device>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl GatewayDetail {
    pub fn new(gateway: Gateway, devices: Vec<Device>) -> Self {
        Self {
            id: gateway.id,
            serial: gateway.serial,
            name: gateway.name,
            ip_address: gateway.ip_address,
            devices,
            created_at: gateway.created_at,
            updated_at: gateway.updated_at,
        }
    }
}

/// Request to create a gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGateway {
    /// Generated when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Request to update a gateway. Omitted fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGateway {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}
