//! Device handlers (gateway sub-resource)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{Device, DeviceInput, ReconcileRequest};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{parse_device_id, parse_gateway_id, AppState};

/// GET /gateways/{gateway_id}/devices
pub async fn list_devices(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    Ok(Json(state.service().list_devices(id).await?))
}

/// POST /gateways/{gateway_id}/devices
/// Create a device and attach it; fails once the gateway holds 10 devices
pub async fn create_device(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
    JsonBody(request): JsonBody<DeviceInput>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    let device = state.service().create_device(id, request).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// PUT /gateways/{gateway_id}/devices
/// Bulk-reconcile the gateway's devices against the submitted list.
///
/// Create entries beyond the 10-device cap are dropped without error.
pub async fn reconcile_devices(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
    JsonBody(request): JsonBody<ReconcileRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    state
        .service()
        .reconcile_devices(id, &request.devices)
        .await?;
    Ok(StatusCode::OK)
}

/// GET /gateways/{gateway_id}/devices/{device_id}
pub async fn get_device(
    State(state): State<AppState>,
    Path((gateway_id, device_id)): Path<(String, String)>,
) -> Result<Json<Device>, ApiError> {
    let gateway_id = parse_gateway_id(&gateway_id)?;
    let device_id = parse_device_id(&device_id)?;
    Ok(Json(state.service().get_device(gateway_id, device_id).await?))
}

/// PUT /gateways/{gateway_id}/devices/{device_id}
pub async fn update_device(
    State(state): State<AppState>,
    Path((gateway_id, device_id)): Path<(String, String)>,
    JsonBody(request): JsonBody<DeviceInput>,
) -> Result<Json<Device>, ApiError> {
    let gateway_id = parse_gateway_id(&gateway_id)?;
    let device_id = parse_device_id(&device_id)?;
    let device = state
        .service()
        .update_device(gateway_id, device_id, request)
        .await?;
    Ok(Json(device))
}

/// DELETE /gateways/{gateway_id}/devices/{device_id}
/// Detach the device and delete its record
pub async fn delete_device(
    State(state): State<AppState>,
    Path((gateway_id, device_id)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let gateway_id = parse_gateway_id(&gateway_id)?;
    let device_id = parse_device_id(&device_id)?;
    state.service().delete_device(gateway_id, device_id).await?;
    Ok(format!("Deleted device {}", device_id))
}
