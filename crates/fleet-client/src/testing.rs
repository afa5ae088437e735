//! Test utilities for fleet-client
//!
//! [`TestServer`] serves a router on an ephemeral loopback port and pairs it
//! with a [`FleetClient`]. The seeding helpers build gateways and devices
//! through the API so tests start from realistic state.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use fleet_core::{CreateGateway, Device, DeviceInput, Gateway};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{FleetClient, Result};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
const CLIENT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Background `axum::serve` task and its shutdown trigger
struct ServeTask {
    stop: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ServeTask {
    async fn spawn(router: Router) -> Result<(SocketAddr, Self)> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let (stop, stopped) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = stopped.await;
            });
            if let Err(e) = serve.await {
                tracing::warn!("Test server exited with error: {}", e);
            }
        });

        Ok((addr, Self { stop, join }))
    }
}

/// A fleet API served on loopback for the lifetime of a test
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: FleetClient,
    task: Option<ServeTask>,
}

impl TestServer {
    /// Serve `router` and connect a client to it
    ///
    /// ```ignore
    /// use fleet_api::{create_router, AppState};
    ///
    /// let server = TestServer::start(create_router(AppState::in_memory())).await?;
    /// let (gateway, devices) = server.seed_gateway("north", "10.0.0.5", 3).await?;
    /// ```
    pub async fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, CLIENT_TIMEOUT, CLIENT_CONNECT_TIMEOUT).await
    }

    /// Serve `router` with custom client timeouts
    pub async fn start_with_timeout(
        router: Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let (addr, task) = ServeTask::spawn(router).await?;
        let client = FleetClient::with_config(&base_url(addr), timeout, connect_timeout)?;

        Ok(Self {
            addr,
            client,
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> String {
        base_url(self.addr)
    }

    pub fn client(&self) -> &FleetClient {
        &self.client
    }

    /// Create a gateway with `devices` online members named `<name>-dev-<n>`
    pub async fn seed_gateway(
        &self,
        name: &str,
        ip_address: &str,
        devices: usize,
    ) -> Result<(Gateway, Vec<Device>)> {
        let gateway = self
            .client
            .create_gateway(&CreateGateway {
                serial: None,
                name: name.to_string(),
                ip_address: Some(ip_address.to_string()),
            })
            .await?;

        let mut created = Vec::with_capacity(devices);
        for i in 0..devices {
            let input = DeviceInput::new(format!("{}-dev-{}", name, i), "acme", "online");
            created.push(self.client.create_device(gateway.id, &input).await?);
        }

        Ok((gateway, created))
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.stop.send(());
            let _ = task.join.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.stop.send(());
            task.join.abort();
        }
    }
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[test]
    fn test_base_url_format() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(base_url(addr), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_server_serves_router() {
        let router = Router::new().route("/healthcheck", get(|| async { "OK" }));
        let server = TestServer::start(router).await.unwrap();

        assert_eq!(server.client().health().await.unwrap(), "OK");
        assert!(server.base_url().starts_with("http://127.0.0.1:"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let router = Router::new().route("/healthcheck", get(|| async { "OK" }));
        let server = TestServer::start(router).await.unwrap();
        let client = server.client.clone();

        server.shutdown().await;
        assert!(client.health().await.is_err());
    }
}
