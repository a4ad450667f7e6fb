use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use super::ErrorResponse;
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::filters::{DashboardSummary, ExpenseFilters};
use crate::services::dashboard_service::{DashboardError, DashboardService};

/// Convert DashboardError to HTTP response
impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let error_type = match self {
            DashboardError::Evaluation(_) => "evaluation_error",
            DashboardError::DatabaseError(_) => "database_error",
        };
        let message = match self {
            DashboardError::DatabaseError(msg) => msg,
            other => other.to_string(),
        };

        ErrorResponse::new(error_type, &message)
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Handler for the dashboard
///
/// Totals, category breakdown and daily totals follow the date/category
/// filters; the current month and the overall budget do not.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(ExpenseFilters),
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardSummary),
        (status = 400, description = "Malformed filter"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "dashboard"
)]
pub async fn dashboard_handler(
    State(dashboard_service): State<Arc<dyn DashboardService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(filters): Query<ExpenseFilters>,
) -> Result<Json<DashboardSummary>, Response> {
    match dashboard_service
        .summary(auth_user.user_id, &filters, Utc::now())
        .await
    {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => Err(e.into_response()),
    }
}
