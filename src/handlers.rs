pub mod auth_handlers;
pub mod budget_handlers;
pub mod category_handlers;
pub mod dashboard_handlers;
pub mod expense_handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::validation::format_validation_errors;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// 400 `validation_error` listing every failing field
pub fn validation_error_response(errors: &ValidationErrors) -> Response {
    ErrorResponse::new("validation_error", &format_validation_errors(errors))
        .into_response_with(StatusCode::BAD_REQUEST)
}

/// Body returned by every delete endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub message: String,
    pub id: Uuid,
}

impl DeletedResponse {
    pub fn new(what: &str, id: Uuid) -> Self {
        Self {
            message: format!("{} deleted successfully", what),
            id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "API is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "API is running".to_string(),
    })
}
