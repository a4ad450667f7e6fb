use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use expense_tracker::app::{build_router, AppState};
use expense_tracker::models::budget::{Budget, BudgetScope};
use expense_tracker::models::category::{Category, CategorySummary};
use expense_tracker::models::expense::Expense;
use expense_tracker::models::filters::ExpenseFilters;
use expense_tracker::models::user::{normalize_email, CreateUserRequest, User};
use expense_tracker::repositories::budget_repository::{BudgetRepository, UpsertOutcome};
use expense_tracker::repositories::category_repository::CategoryRepository;
use expense_tracker::repositories::expense_repository::ExpenseRepository;
use expense_tracker::repositories::user_repository::UserRepository;
use expense_tracker::repositories::RepositoryError;
use expense_tracker::services::{
    auth_service::AuthServiceImpl, budget_service::BudgetServiceImpl,
    category_service::CategoryServiceImpl, dashboard_service::DashboardServiceImpl,
    expense_service::ExpenseServiceImpl,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique email per call so tests never collide
pub fn unique_email(prefix: &str) -> String {
    let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}{}@test.example.com", prefix, count)
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    expenses: HashMap<Uuid, Expense>,
    budgets: HashMap<Uuid, Budget>,
}

impl Tables {
    // Same join rule as the SQL: the category must still exist for the owner
    fn summary(&self, user_id: Uuid, category_id: Option<Uuid>) -> Option<CategorySummary> {
        category_id
            .and_then(|id| self.categories.get(&id))
            .filter(|c| c.user_id == user_id)
            .map(CategorySummary::from)
    }

    fn joined_expense(&self, expense: &Expense) -> Expense {
        Expense {
            category: self.summary(expense.user_id, Some(expense.category_id)),
            ..expense.clone()
        }
    }

    fn joined_budget(&self, budget: &Budget) -> Budget {
        Budget {
            category: self.summary(budget.user_id, budget.category_id),
            ..budget.clone()
        }
    }

    fn overall_conflict(&self, budget: &Budget) -> bool {
        budget.scope == BudgetScope::Overall
            && self.budgets.values().any(|b| {
                b.id != budget.id
                    && b.user_id == budget.user_id
                    && b.scope == BudgetScope::Overall
                    && b.period == budget.period
            })
    }

    fn name_taken(&self, category: &Category) -> bool {
        self.categories.values().any(|c| {
            c.id != category.id && c.user_id == category.user_id && c.name == category.name
        })
    }

    fn categories_of(&self, user_id: Uuid) -> Vec<Category> {
        let mut owned: Vec<Category> = self
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.name.cmp(&b.name));
        owned
    }
}

/// In-memory stand-in for Postgres, shared by all four repositories
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(
        &self,
        user: CreateUserRequest,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        let email = normalize_email(&user.email);
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name.trim().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let email = normalize_email(email);
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.get(&id).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.name_taken(&category) {
            return Err(RepositoryError::ConstraintViolation(
                "Category with this name already exists".to_string(),
            ));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories_of(user_id))
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.name_taken(&category) {
            return Err(RepositoryError::ConstraintViolation(
                "Category with this name already exists".to_string(),
            ));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn insert_defaults_if_empty(
        &self,
        user_id: Uuid,
        defaults: &[(&str, &str)],
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.categories.values().all(|c| c.user_id != user_id) {
            let now = Utc::now();
            for (name, color) in defaults {
                let category = Category {
                    id: Uuid::new_v4(),
                    user_id,
                    name: name.to_string(),
                    color: color.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                tables.categories.insert(category.id, category);
            }
        }
        Ok(tables.categories_of(user_id))
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryStore {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.expenses.insert(expense.id, expense.clone());
        Ok(tables.joined_expense(&expense))
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.expenses.contains_key(&expense.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.expenses.insert(expense.id, expense.clone());
        Ok(tables.joined_expense(&expense))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.expenses.get(&id).map(|e| tables.joined_expense(e)))
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut matching: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|e| e.user_id == user_id && filters.matches(e.date, e.category_id))
            .map(|e| tables.joined_expense(e))
            .collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .expenses
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl BudgetRepository for InMemoryStore {
    async fn create(&self, budget: Budget) -> Result<Budget, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.overall_conflict(&budget) {
            return Err(RepositoryError::ConstraintViolation(
                "An overall budget already exists for this period".to_string(),
            ));
        }
        tables.budgets.insert(budget.id, budget.clone());
        Ok(tables.joined_budget(&budget))
    }

    async fn upsert_overall(&self, budget: Budget) -> Result<UpsertOutcome, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .budgets
            .values()
            .find(|b| {
                b.user_id == budget.user_id
                    && b.scope == BudgetScope::Overall
                    && b.period == budget.period
            })
            .map(|b| b.id);

        match existing {
            Some(id) => {
                let updated = tables.budgets.get_mut(&id).map(|existing| {
                    existing.amount = budget.amount;
                    existing.updated_at = Utc::now();
                    existing.clone()
                });
                updated
                    .map(|b| UpsertOutcome::Updated(tables.joined_budget(&b)))
                    .ok_or(RepositoryError::NotFound)
            }
            None => {
                tables.budgets.insert(budget.id, budget.clone());
                Ok(UpsertOutcome::Inserted(tables.joined_budget(&budget)))
            }
        }
    }

    async fn update(&self, budget: Budget) -> Result<Budget, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.budgets.contains_key(&budget.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.overall_conflict(&budget) {
            return Err(RepositoryError::ConstraintViolation(
                "An overall budget already exists for this period".to_string(),
            ));
        }
        tables.budgets.insert(budget.id, budget.clone());
        Ok(tables.joined_budget(&budget))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.budgets.get(&id).map(|b| tables.joined_budget(b)))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Budget>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut owned: Vec<Budget> = tables
            .budgets
            .values()
            .filter(|b| b.user_id == user_id)
            .map(|b| tables.joined_budget(b))
            .collect();
        owned.sort_by_key(|b| b.created_at);
        Ok(owned)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .budgets
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// The full router over a fresh in-memory store
pub fn test_app() -> Router {
    let store = Arc::new(InMemoryStore::default());

    let state = AppState {
        auth_service: Arc::new(AuthServiceImpl::new(
            store.clone(),
            "integration-test-secret".to_string(),
        )),
        category_service: Arc::new(CategoryServiceImpl::new(store.clone())),
        expense_service: Arc::new(ExpenseServiceImpl::new(store.clone(), store.clone())),
        budget_service: Arc::new(BudgetServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
        )),
        dashboard_service: Arc::new(DashboardServiceImpl::new(store.clone(), store)),
    };

    build_router(state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request through the router; `body` is sent as JSON
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Register a fresh user and return a bearer token for them
pub async fn register_and_login(app: &Router, prefix: &str) -> String {
    let email = unique_email(prefix);
    let password = "securepassword123";

    let registered = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Test User", "email": email, "password": password })),
    )
    .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

    let login = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);

    login.body["token"].as_str().unwrap().to_string()
}

/// Id of the user's category called `name`
pub async fn category_id(app: &Router, token: &str, name: &str) -> String {
    let categories = send(app, "GET", "/api/categories", Some(token), None).await;
    categories
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .map(|c| c["id"].as_str().unwrap().to_string())
        .unwrap_or_else(|| panic!("no category named {}", name))
}

/// Decimal fields are serialized as strings
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}
