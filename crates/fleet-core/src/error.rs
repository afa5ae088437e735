//! Common error types for fleet operations

use thiserror::Error;

/// Result type for fleet operations
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors that can occur while managing gateways and their devices
#[derive(Debug, Error)]
pub enum FleetError {
    /// Gateway not found
    #[error("Gateway with id {0} not found")]
    GatewayNotFound(String),

    /// Device not found (or not a member of the addressed gateway)
    #[error("Device with id {0} not found")]
    DeviceNotFound(String),

    /// A field failed validation. The message echoes the offending value.
    #[error("{message}")]
    Validation {
        /// Name of the invalid field (e.g. `ip_address`, `status`)
        field: String,
        /// Human-readable message
        message: String,
    },

    /// Adding a device would exceed the per-gateway cap
    #[error("A gateway can only have {limit} devices associated")]
    CapacityExceeded {
        /// Gateway that is already full
        gateway_id: String,
        /// The cap that was hit
        limit: usize,
    },

    /// Identifier is not well-formed
    #[error("Invalid {kind} id: {raw}")]
    InvalidId {
        /// Which kind of identifier ("gateway", "device")
        kind: &'static str,
        /// The raw value received
        raw: String,
    },

    /// Storage failure with no more specific cause
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FleetError {
    /// Build a validation failure for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FleetError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the invalid field, if this is a validation failure
    pub fn field(&self) -> Option<&str> {
        match self {
            FleetError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FleetError::GatewayNotFound(_) => 404,
            FleetError::DeviceNotFound(_) => 404,
            FleetError::Validation { .. } => 400,
            FleetError::CapacityExceeded { .. } => 400,
            FleetError::InvalidId { .. } => 400,
            FleetError::Storage(_) => 500,
        }
    }
}

impl From<std::io::Error> for FleetError {
    fn from(err: std::io::Error) -> Self {
        FleetError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Storage(format!("snapshot encoding: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FleetError::GatewayNotFound("g".into()).status_code(), 404);
        assert_eq!(FleetError::DeviceNotFound("d".into()).status_code(), 404);
        assert_eq!(FleetError::validation("status", "bad").status_code(), 400);
        assert_eq!(
            FleetError::CapacityExceeded {
                gateway_id: "g".into(),
                limit: 10
            }
            .status_code(),
            400
        );
        assert_eq!(FleetError::Storage("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_capacity_message() {
        let err = FleetError::CapacityExceeded {
            gateway_id: "g".into(),
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "A gateway can only have 10 devices associated"
        );
    }

    #[test]
    fn test_validation_field() {
        let err = FleetError::validation("ip_address", "999.1.1.1 is not a valid IPv4 address!");
        assert_eq!(err.field(), Some("ip_address"));
        assert_eq!(err.to_string(), "999.1.1.1 is not a valid IPv4 address!");
        assert_eq!(FleetError::GatewayNotFound("x".into()).field(), None);
    }
}
