use axum::{
    extract::FromRef,
    http::{header, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    auth_handlers::{login_handler, me_handler, register_handler},
    budget_handlers::{
        budget_status_handler, create_budget_handler, delete_budget_handler,
        list_budgets_handler, update_budget_handler,
    },
    category_handlers::{
        create_category_handler, delete_category_handler, ensure_default_categories_handler,
        list_categories_handler, update_category_handler,
    },
    dashboard_handlers::dashboard_handler,
    expense_handlers::{
        create_expense_handler, delete_expense_handler, list_expenses_handler,
        update_expense_handler,
    },
    health_handler, DeletedResponse, ErrorResponse, HealthResponse,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::models::{
    AuthToken, Budget, BudgetPeriod, BudgetScope, BudgetStatusView, Category, CategoryBreakdown,
    CategorySummary, CreateBudgetRequest, CreateCategoryRequest, CreateExpenseRequest,
    CreateUserRequest, DailyTotal, DashboardSummary, Expense, ExpenseDate, LoginRequest,
    UpdateBudgetRequest, UpdateCategoryRequest, UpdateExpenseRequest, User,
};
use crate::services::{
    auth_service::AuthService,
    budget_evaluator::{ActiveWindow, BudgetEvaluation, BudgetStatus},
    budget_service::BudgetService,
    category_service::CategoryService,
    dashboard_service::DashboardService,
    expense_service::ExpenseService,
};

/// Services shared by every handler; each handler extracts only the one it needs
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub category_service: Arc<dyn CategoryService>,
    pub expense_service: Arc<dyn ExpenseService>,
    pub budget_service: Arc<dyn BudgetService>,
    pub dashboard_service: Arc<dyn DashboardService>,
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler,
        crate::handlers::auth_handlers::register_handler,
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::auth_handlers::me_handler,
        crate::handlers::category_handlers::list_categories_handler,
        crate::handlers::category_handlers::create_category_handler,
        crate::handlers::category_handlers::ensure_default_categories_handler,
        crate::handlers::category_handlers::update_category_handler,
        crate::handlers::category_handlers::delete_category_handler,
        crate::handlers::expense_handlers::list_expenses_handler,
        crate::handlers::expense_handlers::create_expense_handler,
        crate::handlers::expense_handlers::update_expense_handler,
        crate::handlers::expense_handlers::delete_expense_handler,
        crate::handlers::budget_handlers::list_budgets_handler,
        crate::handlers::budget_handlers::create_budget_handler,
        crate::handlers::budget_handlers::budget_status_handler,
        crate::handlers::budget_handlers::update_budget_handler,
        crate::handlers::budget_handlers::delete_budget_handler,
        crate::handlers::dashboard_handlers::dashboard_handler,
    ),
    components(
        schemas(
            User, CreateUserRequest, LoginRequest, AuthToken,
            Category, CategorySummary, CreateCategoryRequest, UpdateCategoryRequest,
            Expense, ExpenseDate, CreateExpenseRequest, UpdateExpenseRequest,
            Budget, BudgetScope, BudgetPeriod, CreateBudgetRequest, UpdateBudgetRequest,
            BudgetStatusView, BudgetEvaluation, BudgetStatus, ActiveWindow,
            DashboardSummary, CategoryBreakdown, DailyTotal,
            ErrorResponse, DeletedResponse, HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness check"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "categories", description = "Expense categories"),
        (name = "expenses", description = "Expense records"),
        (name = "budgets", description = "Budgets and their consumption"),
        (name = "dashboard", description = "Aggregated spending figures")
    ),
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal expenses against budgets",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the application router.
///
/// Everything under `/api` except health, register and login requires a
/// bearer token. API responses are never cached.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler));

    let protected = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route(
            "/api/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/api/categories/defaults",
            post(ensure_default_categories_handler),
        )
        .route(
            "/api/categories/{id}",
            put(update_category_handler).delete(delete_category_handler),
        )
        .route(
            "/api/expenses",
            get(list_expenses_handler).post(create_expense_handler),
        )
        .route(
            "/api/expenses/{id}",
            put(update_expense_handler).delete(delete_expense_handler),
        )
        .route(
            "/api/budgets",
            get(list_budgets_handler).post(create_budget_handler),
        )
        .route("/api/budgets/status", get(budget_status_handler))
        .route(
            "/api/budgets/{id}",
            put(update_budget_handler).delete(delete_budget_handler),
        )
        .route("/api/dashboard", get(dashboard_handler))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
