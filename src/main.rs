use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use expense_tracker::app::{build_router, AppState};
use expense_tracker::config::AppConfig;
use expense_tracker::repositories::{
    budget_repository::PostgresBudgetRepository, category_repository::PostgresCategoryRepository,
    expense_repository::PostgresExpenseRepository, user_repository::PostgresUserRepository,
};
use expense_tracker::services::{
    auth_service::AuthServiceImpl, budget_service::BudgetServiceImpl,
    category_service::CategoryServiceImpl, dashboard_service::DashboardServiceImpl,
    expense_service::ExpenseServiceImpl,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("expense_tracker=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool.clone()));
    let budget_repository = Arc::new(PostgresBudgetRepository::new(pool));

    let state = AppState {
        auth_service: Arc::new(
            AuthServiceImpl::new(user_repository, config.jwt_secret.clone())
                .with_token_ttl(Duration::hours(config.token_ttl_hours)),
        ),
        category_service: Arc::new(CategoryServiceImpl::new(category_repository.clone())),
        expense_service: Arc::new(ExpenseServiceImpl::new(
            expense_repository.clone(),
            category_repository.clone(),
        )),
        budget_service: Arc::new(BudgetServiceImpl::new(
            budget_repository.clone(),
            expense_repository.clone(),
            category_repository,
        )),
        dashboard_service: Arc::new(DashboardServiceImpl::new(
            expense_repository,
            budget_repository,
        )),
    };

    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, docs = %format!("http://{}/api/docs", addr), "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
