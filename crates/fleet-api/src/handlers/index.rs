//! Banner and liveness handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct IndexResponse {
    pub title: &'static str,
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        title: "Gateways API",
    })
}

/// GET /healthcheck
pub async fn healthcheck() -> &'static str {
    "OK"
}
