//! Gateway handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{CreateGateway, Gateway, GatewayDetail, UpdateGateway};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{parse_gateway_id, AppState};

/// GET /gateways
/// List all gateways with their devices resolved
pub async fn list_gateways(
    State(state): State<AppState>,
) -> Result<Json<Vec<GatewayDetail>>, ApiError> {
    Ok(Json(state.service().list_gateways().await?))
}

/// POST /gateways
pub async fn create_gateway(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateGateway>,
) -> Result<(StatusCode, Json<Gateway>), ApiError> {
    let gateway = state.service().create_gateway(request).await?;
    Ok((StatusCode::CREATED, Json(gateway)))
}

/// GET /gateways/{gateway_id}
pub async fn get_gateway(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
) -> Result<Json<Gateway>, ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    Ok(Json(state.service().get_gateway(id).await?))
}

/// PUT /gateways/{gateway_id}
pub async fn update_gateway(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
    JsonBody(request): JsonBody<UpdateGateway>,
) -> Result<Json<Gateway>, ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    Ok(Json(state.service().update_gateway(id, request).await?))
}

/// DELETE /gateways/{gateway_id}
/// Device records of the gateway are kept
pub async fn delete_gateway(
    State(state): State<AppState>,
    Path(gateway_id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_gateway_id(&gateway_id)?;
    let gateway = state.service().delete_gateway(id).await?;
    Ok(format!(
        "Deleted gateway {}({})",
        gateway.name, gateway.ip_address
    ))
}
