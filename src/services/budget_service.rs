use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::budget::{Budget, BudgetScope, CreateBudgetRequest, UpdateBudgetRequest};
use crate::models::category::CategorySummary;
use crate::models::filters::{BudgetStatusView, ExpenseFilters};
use crate::repositories::budget_repository::{BudgetRepository, UpsertOutcome};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::RepositoryError;
use crate::services::budget_evaluator::{self, EvaluationError};

/// Budget service errors
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Budget not found")]
    BudgetNotFound,

    #[error("Unauthorized to access this budget")]
    Unauthorized,

    #[error("An overall budget already exists for this period")]
    DuplicateOverall,

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for BudgetError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => BudgetError::BudgetNotFound,
            RepositoryError::ConstraintViolation(_) => BudgetError::DuplicateOverall,
            RepositoryError::DatabaseError(msg) => BudgetError::DatabaseError(msg),
        }
    }
}

/// Trait defining budget service operations
#[async_trait]
pub trait BudgetService: Send + Sync {
    /// List a user's budgets
    async fn list(&self, user_id: Uuid) -> Result<Vec<Budget>, BudgetError>;

    /// Create a budget. An overall budget for a period that already has one
    /// replaces that budget's amount and comes back as `Updated`.
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateBudgetRequest,
    ) -> Result<UpsertOutcome, BudgetError>;

    /// Apply the fields present in `request` to a budget the user owns
    async fn update(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        request: UpdateBudgetRequest,
    ) -> Result<Budget, BudgetError>;

    /// Delete a budget the user owns
    async fn delete(&self, user_id: Uuid, budget_id: Uuid) -> Result<(), BudgetError>;

    /// Every budget of the user evaluated at `now`
    async fn statuses(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetStatusView>, BudgetError>;
}

/// Implementation of BudgetService
pub struct BudgetServiceImpl {
    budget_repository: Arc<dyn BudgetRepository>,
    expense_repository: Arc<dyn ExpenseRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl BudgetServiceImpl {
    pub fn new(
        budget_repository: Arc<dyn BudgetRepository>,
        expense_repository: Arc<dyn ExpenseRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            budget_repository,
            expense_repository,
            category_repository,
        }
    }

    /// Summary of the category a category budget points at. The category
    /// must be present and owned by the user.
    async fn owned_category(
        &self,
        user_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<CategorySummary, BudgetError> {
        let category_id = category_id.ok_or_else(|| {
            BudgetError::Validation(
                "category: Category is required for category budgets".to_string(),
            )
        })?;

        let category = self
            .category_repository
            .find_by_id(category_id)
            .await
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?
            .filter(|c| c.user_id == user_id);

        match category {
            Some(category) => Ok(CategorySummary::from(&category)),
            None => {
                tracing::warn!(%user_id, %category_id, "budget rejected: unknown category");
                Err(BudgetError::Validation(
                    "category: Category not found".to_string(),
                ))
            }
        }
    }

    async fn find_owned(&self, user_id: Uuid, budget_id: Uuid) -> Result<Budget, BudgetError> {
        let budget = self
            .budget_repository
            .find_by_id(budget_id)
            .await?
            .ok_or(BudgetError::BudgetNotFound)?;

        if budget.user_id != user_id {
            tracing::warn!(%user_id, %budget_id, "budget access denied");
            return Err(BudgetError::Unauthorized);
        }
        Ok(budget)
    }
}

#[async_trait]
impl BudgetService for BudgetServiceImpl {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Budget>, BudgetError> {
        Ok(self.budget_repository.find_by_user(user_id).await?)
    }

    async fn create(
        &self,
        user_id: Uuid,
        request: CreateBudgetRequest,
    ) -> Result<UpsertOutcome, BudgetError> {
        let now = Utc::now();
        let mut budget = Budget {
            id: Uuid::new_v4(),
            user_id,
            scope: request.scope,
            category_id: None,
            category: None,
            amount: request.amount,
            period: request.period,
            created_at: now,
            updated_at: now,
        };

        let outcome = match request.scope {
            BudgetScope::Overall => self.budget_repository.upsert_overall(budget).await?,
            BudgetScope::Category => {
                let category = self.owned_category(user_id, request.category).await?;
                budget.category_id = Some(category.id);
                budget.category = Some(category);
                UpsertOutcome::Inserted(self.budget_repository.create(budget).await?)
            }
        };

        match &outcome {
            UpsertOutcome::Inserted(budget) => tracing::info!(
                %user_id,
                budget_id = %budget.id,
                scope = budget.scope.as_str(),
                period = %budget.period,
                "budget created"
            ),
            UpsertOutcome::Updated(budget) => tracing::info!(
                %user_id,
                budget_id = %budget.id,
                period = %budget.period,
                "overall budget amount replaced"
            ),
        }
        Ok(outcome)
    }

    async fn update(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        request: UpdateBudgetRequest,
    ) -> Result<Budget, BudgetError> {
        let existing = self.find_owned(user_id, budget_id).await?;
        let scope = request.scope.unwrap_or(existing.scope);

        // Overall budgets never carry a category. A kept category is not
        // re-checked, so a budget whose category was deleted stays editable.
        let (category_id, category) = match (scope, request.category, existing.category_id) {
            (BudgetScope::Overall, _, _) => (None, None),
            (BudgetScope::Category, None, Some(kept)) => (Some(kept), existing.category.clone()),
            (BudgetScope::Category, requested, _) => {
                let summary = self.owned_category(user_id, requested).await?;
                (Some(summary.id), Some(summary))
            }
        };

        let updated = Budget {
            scope,
            category_id,
            category,
            amount: request.amount.unwrap_or(existing.amount),
            period: request.period.unwrap_or(existing.period),
            updated_at: Utc::now(),
            ..existing
        };

        let saved = self.budget_repository.update(updated).await?;
        tracing::info!(%user_id, %budget_id, "budget updated");
        Ok(saved)
    }

    async fn delete(&self, user_id: Uuid, budget_id: Uuid) -> Result<(), BudgetError> {
        self.find_owned(user_id, budget_id).await?;
        self.budget_repository.delete(budget_id).await?;
        tracing::info!(%user_id, %budget_id, "budget deleted");
        Ok(())
    }

    async fn statuses(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetStatusView>, BudgetError> {
        let budgets = self.budget_repository.find_by_user(user_id).await?;

        // Only fetch back to the earliest window any budget looks at
        let Some(earliest) = budgets
            .iter()
            .map(|budget| budget_evaluator::active_window(budget.period, now).start)
            .min()
        else {
            return Ok(Vec::new());
        };

        let filters = ExpenseFilters {
            start_date: Some(earliest.date_naive()),
            ..Default::default()
        };
        let expenses = self
            .expense_repository
            .find_by_user(user_id, &filters)
            .await
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?;

        budgets
            .into_iter()
            .map(|budget| -> Result<BudgetStatusView, BudgetError> {
                let evaluation = budget_evaluator::evaluate(&budget, &expenses, now)?;
                Ok(BudgetStatusView { budget, evaluation })
            })
            .collect()
    }
}
