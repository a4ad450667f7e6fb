use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::category::CategorySummary;
use crate::models::expense::{CreateExpenseRequest, Expense, UpdateExpenseRequest};
use crate::models::filters::ExpenseFilters;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::RepositoryError;

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Unauthorized to access this expense")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ExpenseError::ExpenseNotFound,
            RepositoryError::DatabaseError(msg) => ExpenseError::DatabaseError(msg),
            RepositoryError::ConstraintViolation(msg) => ExpenseError::DatabaseError(msg),
        }
    }
}

/// Trait defining expense service operations
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// List a user's expenses matching `filters`, newest first
    async fn list(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, ExpenseError>;

    /// Record a new expense
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Apply the fields present in `request` to an expense the user owns
    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Delete an expense the user owns
    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl ExpenseServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            expense_repository,
            category_repository,
        }
    }

    /// Summary of a category the user owns; anything else is a validation error
    async fn owned_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategorySummary, ExpenseError> {
        let category = self
            .category_repository
            .find_by_id(category_id)
            .await?
            .filter(|c| c.user_id == user_id);

        match category {
            Some(category) => Ok(CategorySummary::from(&category)),
            None => {
                tracing::warn!(%user_id, %category_id, "expense rejected: unknown category");
                Err(ExpenseError::Validation(
                    "category: Category not found".to_string(),
                ))
            }
        }
    }

    async fn find_owned(&self, user_id: Uuid, expense_id: Uuid) -> Result<Expense, ExpenseError> {
        let expense = self
            .expense_repository
            .find_by_id(expense_id)
            .await?
            .ok_or(ExpenseError::ExpenseNotFound)?;

        if expense.user_id != user_id {
            tracing::warn!(%user_id, %expense_id, "expense access denied");
            return Err(ExpenseError::Unauthorized);
        }
        Ok(expense)
    }
}

fn normalized_description(description: &str) -> Result<String, ExpenseError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ExpenseError::Validation(
            "description: Description must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn list(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>, ExpenseError> {
        Ok(self.expense_repository.find_by_user(user_id, filters).await?)
    }

    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let category = self.owned_category(user_id, request.category).await?;
        let now = Utc::now();

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            amount: request.amount,
            description: normalized_description(&request.description)?,
            category_id: category.id,
            category: Some(category),
            date: request.date.map_or(now, |date| date.into_timestamp()),
            created_at: now,
            updated_at: now,
        };

        let created = self.expense_repository.create(expense).await?;
        tracing::info!(
            %user_id,
            expense_id = %created.id,
            amount = %created.amount,
            "expense created"
        );
        Ok(created)
    }

    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let existing = self.find_owned(user_id, expense_id).await?;

        let (category_id, category) = match request.category {
            Some(category_id) => {
                let summary = self.owned_category(user_id, category_id).await?;
                (category_id, Some(summary))
            }
            None => (existing.category_id, existing.category.clone()),
        };

        let description = match request.description {
            Some(description) => normalized_description(&description)?,
            None => existing.description.clone(),
        };

        let updated = Expense {
            amount: request.amount.unwrap_or(existing.amount),
            description,
            category_id,
            category,
            date: request
                .date
                .map_or(existing.date, |date| date.into_timestamp()),
            updated_at: Utc::now(),
            ..existing
        };

        let saved = self.expense_repository.update(updated).await?;
        tracing::info!(%user_id, %expense_id, "expense updated");
        Ok(saved)
    }

    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError> {
        self.find_owned(user_id, expense_id).await?;
        self.expense_repository.delete(expense_id).await?;
        tracing::info!(%user_id, %expense_id, "expense deleted");
        Ok(())
    }
}
