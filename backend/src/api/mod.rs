//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod admin;
mod auth;
mod resources;
mod search;

pub use admin::*;
pub use auth::*;
pub use resources::*;
pub use search::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
    #[serde(skip)]
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create a `201 Created` API response.
pub fn created<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    let mut response = ApiResponse::new(data, revision_id);
    response.status = StatusCode::CREATED;
    Ok(response)
}

/// Create an error API response.
pub fn error<T: Serialize>(err: crate::errors::AppError, revision_id: i64) -> ApiResult<T> {
    Err(err.with_revision(revision_id))
}
