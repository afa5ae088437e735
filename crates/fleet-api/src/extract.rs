//! Request extractors

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections answer with the standard error body
/// instead of axum's plain-text response
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
