//! Budget period and consumption model.
//!
//! Everything here is a pure function of its inputs: the active window is
//! derived from a reference instant and the budget's period, expenses are
//! attributed to the budget by window and scope, and the attributed total is
//! classified against the budget amount. Window boundaries use the UTC calendar.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::budget::{Budget, BudgetPeriod, BudgetScope};
use crate::models::expense::Expense;

/// Consumption (in percent) at which a budget turns to `warning`
pub const WARNING_PERCENTAGE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Consumption (in percent) at which a budget turns to `over`
pub const OVER_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("budget {budget_id} is category-scoped but has no category")]
    MissingCategory { budget_id: Uuid },
}

/// The `[start, end]` range over which a budget's consumption is measured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ActiveWindow {
    /// Inclusive on both ends
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Consumption classification of a budget
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    #[serde(rename = "ok")]
    OnTrack,
    Warning,
    Over,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: Decimal) -> Self {
        if percentage >= OVER_PERCENTAGE {
            BudgetStatus::Over
        } else if percentage >= WARNING_PERCENTAGE {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }
}

/// A budget's consumption at a reference instant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetEvaluation {
    pub window: ActiveWindow,
    #[schema(value_type = String)]
    pub spent: Decimal,
    /// Negative once the budget is exceeded
    #[schema(value_type = String)]
    pub remaining: Decimal,
    /// Rounded to two decimal places; 0 for a zero-amount budget
    #[schema(value_type = String)]
    pub percentage: Decimal,
    pub status: BudgetStatus,
}

/// Window of the period containing `now`, ending at `now`.
///
/// Weeks start on Sunday at 00:00.
pub fn active_window(period: BudgetPeriod, now: DateTime<Utc>) -> ActiveWindow {
    let today = now.date_naive();
    let days_back = match period {
        BudgetPeriod::Monthly => today.day0(),
        BudgetPeriod::Weekly => today.weekday().num_days_from_sunday(),
        BudgetPeriod::Yearly => today.ordinal0(),
    };
    let first_day = today - Days::new(u64::from(days_back));

    ActiveWindow {
        start: first_day.and_time(NaiveTime::MIN).and_utc(),
        end: now,
    }
}

/// Expenses counted against `budget` within `window`.
///
/// Overall budgets take every in-window expense; category budgets only
/// those in their category.
pub fn attribute<'a>(
    budget: &Budget,
    expenses: &'a [Expense],
    window: &ActiveWindow,
) -> Result<Vec<&'a Expense>, EvaluationError> {
    let category = match budget.scope {
        BudgetScope::Overall => None,
        BudgetScope::Category => Some(
            budget
                .category_id
                .ok_or(EvaluationError::MissingCategory {
                    budget_id: budget.id,
                })?,
        ),
    };

    Ok(expenses
        .iter()
        .filter(|expense| window.contains(expense.date))
        .filter(|expense| category.map_or(true, |id| expense.category_id == id))
        .collect())
}

/// Sum of amounts, zero for an empty subset
pub fn spent<'a, I>(subset: I) -> Decimal
where
    I: IntoIterator<Item = &'a Expense>,
{
    subset.into_iter().map(|expense| expense.amount).sum()
}

/// `spent` as a percentage of `amount`, 0 when `amount` is 0
pub fn percentage(spent: Decimal, amount: Decimal) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    spent
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(amount))
        .unwrap_or(Decimal::MAX)
}

/// Evaluates `budget` against `expenses` at `now`
pub fn evaluate(
    budget: &Budget,
    expenses: &[Expense],
    now: DateTime<Utc>,
) -> Result<BudgetEvaluation, EvaluationError> {
    let window = active_window(budget.period, now);
    let spent = spent(attribute(budget, expenses, &window)?);
    // Classify the reported figure so status and percentage never disagree
    let percentage = percentage(spent, budget.amount).round_dp(2);

    Ok(BudgetEvaluation {
        window,
        spent,
        remaining: budget.amount - spent,
        percentage,
        status: BudgetStatus::from_percentage(percentage),
    })
}
