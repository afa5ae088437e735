//! fleet-core - Core types and logic for the gateway fleet service
//!
//! This crate holds the data model, field validators, repository traits,
//! the in-memory store and the bulk device reconciliation engine. The REST
//! layer in `fleet-api` is a thin shell over [`FleetService`].

pub mod error;
pub mod memory;
pub mod models;
pub mod reconcile;
pub mod repository;
pub mod service;
pub mod validate;

pub use error::{FleetError, FleetResult};
pub use memory::{MemoryStore, Snapshot};
pub use models::*;
pub use reconcile::{ReconcileReport, ReconciliationEngine};
pub use repository::{DeviceRepository, GatewayRepository, Repositories, UnitOfWork};
pub use service::FleetService;
