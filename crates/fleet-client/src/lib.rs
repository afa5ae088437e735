//! Fleet Client Library
//!
//! Typed HTTP client for the gateway fleet REST API.
//!
//! # Example
//!
//! ```rust,no_run
//! use fleet_client::FleetClient;
//! use fleet_core::CreateGateway;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetClient::new("http://localhost:3000")?;
//!
//!     let gateway = client
//!         .create_gateway(&CreateGateway {
//!             serial: None,
//!             name: "north-wing".into(),
//!             ip_address: Some("10.0.0.5".into()),
//!         })
//!         .await?;
//!
//!     let devices = client.list_devices(gateway.id).await?;
//!     println!("{} devices", devices.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! ```rust,ignore
//! use fleet_client::testing::TestServer;
//! use fleet_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(AppState::in_memory())).await?;
//! let gateways = server.client.list_gateways().await?;
//! ```

mod client;
mod error;
pub mod testing;

pub use client::FleetClient;
pub use error::{FleetClientError, Result};
