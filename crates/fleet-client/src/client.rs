//! Fleet HTTP client implementation

use std::time::Duration;

use fleet_core::{
    CreateGateway, Device, DeviceDescriptor, DeviceInput, Gateway, GatewayDetail,
    ReconcileRequest, UpdateGateway,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::error::{ErrorBody, FleetClientError, Result};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fleet REST API client
#[derive(Debug, Clone)]
pub struct FleetClient {
    client: Client,
    base_url: Url,
}

impl FleetClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the server (e.g., "http://localhost:3000")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn gateway_url(&self, gateway_id: Uuid) -> Result<Url> {
        Ok(self.base_url.join(&format!("/gateways/{}", gateway_id))?)
    }

    fn devices_url(&self, gateway_id: Uuid) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("/gateways/{}/devices", gateway_id))?)
    }

    fn device_url(&self, gateway_id: Uuid, device_id: Uuid) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("/gateways/{}/devices/{}", gateway_id, device_id))?)
    }

    // =========================================================================
    // Health Check
    // =========================================================================

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/healthcheck")?;
        let response = self.client.get(url).send().await?;
        self.handle_text(response).await
    }

    // =========================================================================
    // Gateway Operations
    // =========================================================================

    /// List all gateways with their devices
    #[instrument(skip(self))]
    pub async fn list_gateways(&self) -> Result<Vec<GatewayDetail>> {
        let url = self.base_url.join("/gateways")?;
        debug!("Listing gateways from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Create a gateway
    #[instrument(skip(self))]
    pub async fn create_gateway(&self, request: &CreateGateway) -> Result<Gateway> {
        let url = self.base_url.join("/gateways")?;
        let response = self.client.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Get a gateway
    #[instrument(skip(self))]
    pub async fn get_gateway(&self, gateway_id: Uuid) -> Result<Gateway> {
        let response = self.client.get(self.gateway_url(gateway_id)?).send().await?;
        self.handle_response(response).await
    }

    /// Update a gateway's supplied fields
    #[instrument(skip(self))]
    pub async fn update_gateway(
        &self,
        gateway_id: Uuid,
        request: &UpdateGateway,
    ) -> Result<Gateway> {
        let response = self
            .client
            .put(self.gateway_url(gateway_id)?)
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a gateway, returning the server's confirmation text
    #[instrument(skip(self))]
    pub async fn delete_gateway(&self, gateway_id: Uuid) -> Result<String> {
        let response = self
            .client
            .delete(self.gateway_url(gateway_id)?)
            .send()
            .await?;
        self.handle_text(response).await
    }

    // =========================================================================
    // Device Operations
    // =========================================================================

    /// List a gateway's devices
    #[instrument(skip(self))]
    pub async fn list_devices(&self, gateway_id: Uuid) -> Result<Vec<Device>> {
        let response = self.client.get(self.devices_url(gateway_id)?).send().await?;
        self.handle_response(response).await
    }

    /// Create a device on a gateway
    #[instrument(skip(self))]
    pub async fn create_device(&self, gateway_id: Uuid, device: &DeviceInput) -> Result<Device> {
        let response = self
            .client
            .post(self.devices_url(gateway_id)?)
            .json(device)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Bulk-reconcile a gateway's devices against `devices`
    #[instrument(skip(self, devices), fields(count = devices.len()))]
    pub async fn reconcile_devices(
        &self,
        gateway_id: Uuid,
        devices: &[DeviceDescriptor],
    ) -> Result<()> {
        let request = ReconcileRequest {
            devices: devices.to_vec(),
        };
        let response = self
            .client
            .put(self.devices_url(gateway_id)?)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Get a device of a gateway
    #[instrument(skip(self))]
    pub async fn get_device(&self, gateway_id: Uuid, device_id: Uuid) -> Result<Device> {
        let response = self
            .client
            .get(self.device_url(gateway_id, device_id)?)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update a device of a gateway
    #[instrument(skip(self))]
    pub async fn update_device(
        &self,
        gateway_id: Uuid,
        device_id: Uuid,
        device: &DeviceInput,
    ) -> Result<Device> {
        let response = self
            .client
            .put(self.device_url(gateway_id, device_id)?)
            .json(device)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a device of a gateway, returning the server's confirmation text
    #[instrument(skip(self))]
    pub async fn delete_device(&self, gateway_id: Uuid, device_id: Uuid) -> Result<String> {
        let response = self
            .client
            .delete(self.device_url(gateway_id, device_id)?)
            .send()
            .await?;
        self.handle_text(response).await
    }

    // =========================================================================
    // Response handling
    // =========================================================================

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FleetClientError::ParseError(e.to_string()))
    }

    async fn handle_text(&self, response: Response) -> Result<String> {
        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    async fn extract_error(&self, response: Response) -> FleetClientError {
        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return FleetClientError::HttpError(e),
        };

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => FleetClientError::ServerError {
                status,
                message: body.message,
                field: body.field,
            },
            Err(_) => FleetClientError::server_error(status, text),
        }
    }
}
