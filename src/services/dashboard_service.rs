use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::budget::{Budget, BudgetPeriod, BudgetScope};
use crate::models::expense::Expense;
use crate::models::filters::{BudgetStatusView, DashboardSummary, ExpenseFilters};
use crate::repositories::budget_repository::BudgetRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::services::budget_evaluator::{self, EvaluationError};
use crate::services::reports;

/// Dashboard service errors
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Trait defining dashboard operations
#[async_trait]
pub trait DashboardService: Send + Sync {
    /// Aggregate a user's spending at `now`. `filters` narrows the total,
    /// breakdown and daily totals; the month figure and budget ignore it.
    async fn summary(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, DashboardError>;
}

/// Implementation of DashboardService
pub struct DashboardServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    budget_repository: Arc<dyn BudgetRepository>,
}

impl DashboardServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        budget_repository: Arc<dyn BudgetRepository>,
    ) -> Self {
        Self {
            expense_repository,
            budget_repository,
        }
    }
}

/// The overall budget shown on the dashboard: monthly if there is one
fn headline_budget(budgets: Vec<Budget>) -> Option<Budget> {
    let mut overall = budgets
        .into_iter()
        .filter(|budget| budget.scope == BudgetScope::Overall);
    let first = overall.next()?;
    if first.period == BudgetPeriod::Monthly {
        return Some(first);
    }
    Some(
        overall
            .find(|budget| budget.period == BudgetPeriod::Monthly)
            .unwrap_or(first),
    )
}

#[async_trait]
impl DashboardService for DashboardServiceImpl {
    async fn summary(
        &self,
        user_id: Uuid,
        filters: &ExpenseFilters,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, DashboardError> {
        // One fetch; every figure is derived in-process
        let expenses = self
            .expense_repository
            .find_by_user(user_id, &ExpenseFilters::default())
            .await
            .map_err(|e| DashboardError::DatabaseError(e.to_string()))?;
        let budgets = self
            .budget_repository
            .find_by_user(user_id)
            .await
            .map_err(|e| DashboardError::DatabaseError(e.to_string()))?;

        let filtered: Vec<Expense> = expenses
            .iter()
            .filter(|expense| filters.matches(expense.date, expense.category_id))
            .cloned()
            .collect();

        let month = budget_evaluator::active_window(BudgetPeriod::Monthly, now);
        let this_month = budget_evaluator::spent(
            expenses
                .iter()
                .filter(|expense| month.contains(expense.date)),
        );

        let overall_budget = match headline_budget(budgets) {
            Some(budget) => {
                let evaluation = budget_evaluator::evaluate(&budget, &expenses, now)?;
                Some(BudgetStatusView { budget, evaluation })
            }
            None => None,
        };

        tracing::debug!(%user_id, expenses = filtered.len(), "dashboard computed");

        Ok(DashboardSummary {
            total: reports::total_spent(&filtered),
            this_month,
            overall_budget,
            category_breakdown: reports::category_breakdown(&filtered),
            daily_totals: reports::daily_totals(&filtered),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::CategorySummary;
    use crate::repositories::budget_repository::UpsertOutcome;
    use crate::repositories::RepositoryError;
    use crate::services::budget_evaluator::BudgetStatus;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    struct MockExpenseRepository {
        expenses: Vec<Expense>,
        should_fail: bool,
    }

    #[async_trait]
    impl ExpenseRepository for MockExpenseRepository {
        async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
            Ok(expense)
        }

        async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
            Ok(expense)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
            Ok(self.expenses.iter().find(|e| e.id == id).cloned())
        }

        async fn find_by_user(
            &self,
            user_id: Uuid,
            filters: &ExpenseFilters,
        ) -> Result<Vec<Expense>, RepositoryError> {
            if self.should_fail {
                return Err(RepositoryError::DatabaseError(
                    "Database connection failed".to_string(),
                ));
            }
            Ok(self
                .expenses
                .iter()
                .filter(|e| e.user_id == user_id && filters.matches(e.date, e.category_id))
                .cloned()
                .collect())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    struct MockBudgetRepository {
        budgets: Vec<Budget>,
    }

    #[async_trait]
    impl BudgetRepository for MockBudgetRepository {
        async fn create(&self, budget: Budget) -> Result<Budget, RepositoryError> {
            Ok(budget)
        }

        async fn upsert_overall(&self, budget: Budget) -> Result<UpsertOutcome, RepositoryError> {
            Ok(UpsertOutcome::Inserted(budget))
        }

        async fn update(&self, budget: Budget) -> Result<Budget, RepositoryError> {
            Ok(budget)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, RepositoryError> {
            Ok(self.budgets.iter().find(|b| b.id == id).cloned())
        }

        async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Budget>, RepositoryError> {
            Ok(self
                .budgets
                .iter()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn summary_of(id: Uuid, name: &str) -> CategorySummary {
        CategorySummary {
            id,
            name: name.to_string(),
            color: "#ef4444".to_string(),
        }
    }

    fn expense(
        user_id: Uuid,
        category: Option<CategorySummary>,
        amount: i64,
        date: DateTime<Utc>,
    ) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id,
            amount: Decimal::from(amount),
            description: "test".to_string(),
            category_id: category.as_ref().map_or_else(Uuid::new_v4, |c| c.id),
            category,
            date,
            created_at: date,
            updated_at: date,
        }
    }

    fn overall(user_id: Uuid, amount: i64, period: BudgetPeriod) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id,
            scope: BudgetScope::Overall,
            category_id: None,
            category: None,
            amount: Decimal::from(amount),
            period,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(expenses: Vec<Expense>, budgets: Vec<Budget>) -> DashboardServiceImpl {
        DashboardServiceImpl::new(
            Arc::new(MockExpenseRepository {
                expenses,
                should_fail: false,
            }),
            Arc::new(MockBudgetRepository { budgets }),
        )
    }

    #[tokio::test]
    async fn test_summary_figures() {
        let user_id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let food = summary_of(Uuid::new_v4(), "Food");
        let fuel = summary_of(Uuid::new_v4(), "Fuel");
        let expenses = vec![
            expense(
                user_id,
                Some(food.clone()),
                300,
                Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
            ),
            expense(
                user_id,
                Some(fuel),
                100,
                Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap(),
            ),
            expense(user_id, None, 200, Utc.with_ymd_and_hms(2024, 5, 28, 9, 0, 0).unwrap()),
        ];
        let budgets = vec![
            overall(user_id, 5000, BudgetPeriod::Yearly),
            overall(user_id, 1000, BudgetPeriod::Monthly),
        ];

        let summary = service(expenses, budgets)
            .summary(user_id, &ExpenseFilters::default(), now)
            .await
            .unwrap();

        assert_eq!(summary.total, Decimal::from(600));
        assert_eq!(summary.this_month, Decimal::from(400));

        let headline = summary.overall_budget.unwrap();
        assert_eq!(headline.budget.period, BudgetPeriod::Monthly);
        assert_eq!(headline.evaluation.spent, Decimal::from(400));
        assert_eq!(headline.evaluation.status, BudgetStatus::OnTrack);

        assert_eq!(summary.category_breakdown[0].name, "Food");
        assert!(summary
            .category_breakdown
            .iter()
            .any(|b| b.name == "Uncategorized" && b.category_id.is_none()));

        assert_eq!(summary.daily_totals.len(), 2);
        assert_eq!(
            summary.daily_totals[1].date,
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert_eq!(summary.daily_totals[1].amount, Decimal::from(400));
    }

    #[tokio::test]
    async fn test_filters_narrow_totals_but_not_month() {
        let user_id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let food = summary_of(Uuid::new_v4(), "Food");
        let expenses = vec![
            expense(
                user_id,
                Some(food.clone()),
                300,
                Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
            ),
            expense(user_id, None, 50, Utc.with_ymd_and_hms(2024, 6, 4, 9, 0, 0).unwrap()),
        ];
        let filters = ExpenseFilters {
            category: Some(food.id),
            ..Default::default()
        };

        let summary = service(expenses, Vec::new())
            .summary(user_id, &filters, now)
            .await
            .unwrap();

        assert_eq!(summary.total, Decimal::from(300));
        assert_eq!(summary.this_month, Decimal::from(350));
        assert_eq!(summary.category_breakdown.len(), 1);
        assert!(summary.overall_budget.is_none());
    }

    #[tokio::test]
    async fn test_headline_falls_back_to_any_overall_budget() {
        let user_id = Uuid::new_v4();
        let weekly = overall(user_id, 100, BudgetPeriod::Weekly);

        let picked = headline_budget(vec![weekly.clone()]).unwrap();
        assert_eq!(picked.id, weekly.id);
        assert!(headline_budget(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_repository_failure_is_database_error() {
        let service = DashboardServiceImpl::new(
            Arc::new(MockExpenseRepository {
                expenses: Vec::new(),
                should_fail: true,
            }),
            Arc::new(MockBudgetRepository { budgets: Vec::new() }),
        );

        let result = service
            .summary(Uuid::new_v4(), &ExpenseFilters::default(), Utc::now())
            .await;
        assert!(matches!(result, Err(DashboardError::DatabaseError(_))));
    }
}
