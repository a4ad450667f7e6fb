use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{validation_error_response, DeletedResponse, ErrorResponse};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::budget::{Budget, CreateBudgetRequest, UpdateBudgetRequest};
use crate::models::filters::BudgetStatusView;
use crate::repositories::budget_repository::UpsertOutcome;
use crate::services::budget_service::{BudgetError, BudgetService};

/// Convert BudgetError to HTTP response
impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            BudgetError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            BudgetError::BudgetNotFound => (
                StatusCode::NOT_FOUND,
                "budget_not_found",
                "Budget not found".to_string(),
            ),
            BudgetError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "unauthorized",
                "Unauthorized to access this budget".to_string(),
            ),
            BudgetError::DuplicateOverall => (
                StatusCode::CONFLICT,
                "duplicate_budget",
                "An overall budget already exists for this period".to_string(),
            ),
            BudgetError::Evaluation(ref e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "evaluation_error",
                e.to_string(),
            ),
            BudgetError::DatabaseError(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                msg.clone(),
            ),
        };

        ErrorResponse::new(error_type, &message).into_response_with(status)
    }
}

/// Handler for listing budgets
#[utoipa::path(
    get,
    path = "/api/budgets",
    responses(
        (status = 200, description = "List of budgets", body = Vec<Budget>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn list_budgets_handler(
    State(budget_service): State<Arc<dyn BudgetService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Budget>>, Response> {
    match budget_service.list(auth_user.user_id).await {
        Ok(budgets) => Ok(Json(budgets)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating a budget
///
/// An overall budget for a period that already has one replaces the
/// existing amount and answers 200 instead of 201.
#[utoipa::path(
    post,
    path = "/api/budgets",
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created", body = Budget),
        (status = 200, description = "Existing overall budget updated", body = Budget),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn create_budget_handler(
    State(budget_service): State<Arc<dyn BudgetService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<Budget>), Response> {
    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(&validation_errors));
    }

    match budget_service.create(auth_user.user_id, request).await {
        Ok(UpsertOutcome::Inserted(budget)) => Ok((StatusCode::CREATED, Json(budget))),
        Ok(UpsertOutcome::Updated(budget)) => Ok((StatusCode::OK, Json(budget))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for budget status
///
/// Evaluates every budget of the user at request time.
#[utoipa::path(
    get,
    path = "/api/budgets/status",
    responses(
        (status = 200, description = "Budgets with consumption", body = Vec<BudgetStatusView>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn budget_status_handler(
    State(budget_service): State<Arc<dyn BudgetService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<BudgetStatusView>>, Response> {
    match budget_service.statuses(auth_user.user_id, Utc::now()).await {
        Ok(statuses) => Ok(Json(statuses)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a budget
#[utoipa::path(
    put,
    path = "/api/budgets/{id}",
    params(
        ("id" = Uuid, Path, description = "Budget ID")
    ),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated", body = Budget),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "User doesn't own the budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 409, description = "Overall budget exists for the period", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn update_budget_handler(
    State(budget_service): State<Arc<dyn BudgetService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<Uuid>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<Json<Budget>, Response> {
    if let Err(validation_errors) = request.validate() {
        return Err(validation_error_response(&validation_errors));
    }

    match budget_service
        .update(auth_user.user_id, budget_id, request)
        .await
    {
        Ok(budget) => Ok(Json(budget)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a budget
#[utoipa::path(
    delete,
    path = "/api/budgets/{id}",
    params(
        ("id" = Uuid, Path, description = "Budget ID")
    ),
    responses(
        (status = 200, description = "Budget deleted", body = DeletedResponse),
        (status = 403, description = "User doesn't own the budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "budgets"
)]
pub async fn delete_budget_handler(
    State(budget_service): State<Arc<dyn BudgetService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, Response> {
    match budget_service.delete(auth_user.user_id, budget_id).await {
        Ok(()) => Ok(Json(DeletedResponse::new("Budget", budget_id))),
        Err(e) => Err(e.into_response()),
    }
}
