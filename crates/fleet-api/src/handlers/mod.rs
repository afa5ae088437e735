//! HTTP request handlers for the fleet API
//!
//! Handlers parse path identifiers and delegate to `FleetService`.

pub mod devices;
pub mod gateways;
pub mod index;
