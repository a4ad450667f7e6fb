use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::category::CategorySummary;
use crate::models::expense::Expense;
use crate::models::filters::ExpenseFilters;

/// Trait defining expense repository operations
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Create a new expense, returned with its category populated
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Update an existing expense, returned with its category populated
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Find an expense by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError>;

    /// Find a user's expenses matching `filters`, sorted by date descending
    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError>;

    /// Delete an expense by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Expense joined with its (possibly deleted) category
#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    description: String,
    category_id: Uuid,
    date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: Option<String>,
    category_color: Option<String>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        let category = match (row.category_name, row.category_color) {
            (Some(name), Some(color)) => Some(CategorySummary {
                id: row.category_id,
                name,
                color,
            }),
            _ => None,
        };

        Expense {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            description: row.description,
            category_id: row.category_id,
            category,
            date: row.date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// The join also matches on owner so a foreign category id never leaks a name
const SELECT_EXPENSES: &str = r#"
    SELECT e.id, e.user_id, e.amount, e.description, e.category_id,
           e.date, e.created_at, e.updated_at,
           c.name AS category_name, c.color AS category_color
    FROM expenses e
    LEFT JOIN categories c ON c.id = e.category_id AND c.user_id = e.user_id
"#;

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, user_id, amount, description, category_id,
                date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.category_id)
        .bind(expense.date)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(expense.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET amount = $2,
                description = $3,
                category_id = $4,
                date = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(expense.id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.category_id)
        .bind(expense.date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(expense.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let query = format!("{} WHERE e.id = $1", SELECT_EXPENSES);
        let row = sqlx::query_as::<_, ExpenseRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Expense::from))
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, RepositoryError> {
        // Build the WHERE clause from whichever filters are present
        let mut query = format!("{} WHERE e.user_id = $1", SELECT_EXPENSES);
        let mut param_count = 1;

        let lower_bound = filters.lower_bound();
        if lower_bound.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND e.date >= ${}", param_count));
        }

        let upper_bound = filters.upper_bound();
        if upper_bound.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND e.date < ${}", param_count));
        }

        if filters.category.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND e.category_id = ${}", param_count));
        }

        query.push_str(" ORDER BY e.date DESC, e.created_at DESC");

        // Bind parameters in the order they were numbered
        let mut sqlx_query = sqlx::query_as::<_, ExpenseRow>(&query).bind(user_id);
        if let Some(start) = lower_bound {
            sqlx_query = sqlx_query.bind(start);
        }
        if let Some(end) = upper_bound {
            sqlx_query = sqlx_query.bind(end);
        }
        if let Some(category_id) = filters.category {
            sqlx_query = sqlx_query.bind(category_id);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
