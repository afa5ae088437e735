//! Application state for the fleet API

use std::sync::Arc;

use fleet_core::{FleetError, FleetService, MemoryStore, Repositories};
use uuid::Uuid;

use crate::error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<FleetService>,
}

impl AppState {
    /// Create a new AppState over the given repositories
    pub fn new(repos: Repositories) -> Self {
        Self {
            service: Arc::new(FleetService::new(repos)),
        }
    }

    /// Create an AppState backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new().repositories())
    }

    /// Get the fleet service
    pub fn service(&self) -> &FleetService {
        &self.service
    }
}

/// Parse a gateway id path segment
pub fn parse_gateway_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_id("gateway", raw)
}

/// Parse a device id path segment
pub fn parse_device_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_id("device", raw)
}

fn parse_id(kind: &'static str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        FleetError::InvalidId {
            kind,
            raw: raw.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_gateway_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_device_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_malformed_id_names_kind() {
        assert!(matches!(
            parse_gateway_id("abc"),
            Err(ApiError::BadRequest(ref msg)) if msg == "Invalid gateway id"
        ));
        assert!(matches!(
            parse_device_id("42"),
            Err(ApiError::BadRequest(ref msg)) if msg == "Invalid device id"
        ));
    }
}
