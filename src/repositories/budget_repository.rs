use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::budget::{Budget, BudgetPeriod, BudgetScope};
use crate::models::category::CategorySummary;

const DUPLICATE_OVERALL: &str = "An overall budget already exists for this period";

/// Result of writing an overall budget
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted(Budget),
    /// An overall budget for the period already existed; its amount was replaced
    Updated(Budget),
}

impl UpsertOutcome {
    pub fn into_budget(self) -> Budget {
        match self {
            UpsertOutcome::Inserted(budget) | UpsertOutcome::Updated(budget) => budget,
        }
    }
}

/// Trait defining budget repository operations
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    /// Insert a budget as-is
    async fn create(&self, budget: Budget) -> Result<Budget, RepositoryError>;

    /// Insert an overall budget, or replace the amount of the existing
    /// overall budget for the same user and period
    async fn upsert_overall(&self, budget: Budget) -> Result<UpsertOutcome, RepositoryError>;

    /// Overwrite scope, category, amount and period of an existing budget
    async fn update(&self, budget: Budget) -> Result<Budget, RepositoryError>;

    /// Find a budget by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, RepositoryError>;

    /// Find all budgets owned by a user, oldest first
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Budget>, RepositoryError>;

    /// Delete a budget by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[derive(Debug, FromRow)]
struct BudgetRow {
    id: Uuid,
    user_id: Uuid,
    scope: String,
    category_id: Option<Uuid>,
    amount: Decimal,
    period: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: Option<String>,
    category_color: Option<String>,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = RepositoryError;

    // Unknown tags mean the row was written by something else; refuse to guess
    fn try_from(row: BudgetRow) -> Result<Self, Self::Error> {
        let scope: BudgetScope = row
            .scope
            .parse()
            .map_err(|e| RepositoryError::DatabaseError(format!("budget {}: {}", row.id, e)))?;
        let period: BudgetPeriod = row
            .period
            .parse()
            .map_err(|e| RepositoryError::DatabaseError(format!("budget {}: {}", row.id, e)))?;

        let category = match (row.category_id, row.category_name, row.category_color) {
            (Some(id), Some(name), Some(color)) => Some(CategorySummary { id, name, color }),
            _ => None,
        };

        Ok(Budget {
            id: row.id,
            user_id: row.user_id,
            scope,
            category_id: row.category_id,
            category,
            amount: row.amount,
            period,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_BUDGETS: &str = r#"
    SELECT b.id, b.user_id, b.scope, b.category_id, b.amount, b.period,
           b.created_at, b.updated_at,
           c.name AS category_name, c.color AS category_color
    FROM budgets b
    LEFT JOIN categories c ON c.id = b.category_id AND c.user_id = b.user_id
"#;

/// PostgreSQL implementation of BudgetRepository
pub struct PostgresBudgetRepository {
    pool: PgPool,
}

impl PostgresBudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_existing(&self, id: Uuid) -> Result<Budget, RepositoryError> {
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl BudgetRepository for PostgresBudgetRepository {
    async fn create(&self, budget: Budget) -> Result<Budget, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO budgets (
                id, user_id, scope, category_id, amount, period, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(budget.id)
        .bind(budget.user_id)
        .bind(budget.scope.as_str())
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .bind(budget.created_at)
        .bind(budget.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_OVERALL))?;

        self.fetch_existing(budget.id).await
    }

    async fn upsert_overall(&self, budget: Budget) -> Result<UpsertOutcome, RepositoryError> {
        // xmax is 0 only for a freshly inserted tuple
        let (id, inserted): (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO budgets (
                id, user_id, scope, category_id, amount, period, created_at, updated_at
            )
            VALUES ($1, $2, 'overall', NULL, $3, $4, $5, $6)
            ON CONFLICT (user_id, period) WHERE scope = 'overall'
            DO UPDATE SET amount = EXCLUDED.amount, updated_at = NOW()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(budget.id)
        .bind(budget.user_id)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .bind(budget.created_at)
        .bind(budget.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let stored = self.fetch_existing(id).await?;
        Ok(if inserted {
            UpsertOutcome::Inserted(stored)
        } else {
            UpsertOutcome::Updated(stored)
        })
    }

    async fn update(&self, budget: Budget) -> Result<Budget, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE budgets
            SET scope = $2,
                category_id = $3,
                amount = $4,
                period = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(budget.id)
        .bind(budget.scope.as_str())
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_OVERALL))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.fetch_existing(budget.id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, RepositoryError> {
        let query = format!("{} WHERE b.id = $1", SELECT_BUDGETS);
        let row = sqlx::query_as::<_, BudgetRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Budget::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Budget>, RepositoryError> {
        let query = format!(
            "{} WHERE b.user_id = $1 ORDER BY b.created_at ASC",
            SELECT_BUDGETS
        );
        let rows = sqlx::query_as::<_, BudgetRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Budget::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
