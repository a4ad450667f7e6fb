use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::services::budget_evaluator::BudgetEvaluation;

use super::budget::Budget;

/// Query filters for listing expenses
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseFilters {
    /// Inclusive, from 00:00 UTC of this day
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive, through the end of this day (UTC)
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<NaiveDate>,
    /// Only expenses in this category
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<Uuid>,
}

impl ExpenseFilters {
    /// Lower bound on `date`, inclusive
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Upper bound on `date`, exclusive: midnight after `end_date`
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|day| day.checked_add_days(Days::new(1)))
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Whether an expense at `date` in `category_id` passes every filter
    pub fn matches(&self, date: DateTime<Utc>, category_id: Uuid) -> bool {
        self.lower_bound().map_or(true, |start| date >= start)
            && self.upper_bound().map_or(true, |end| date < end)
            && self.category.map_or(true, |category| category == category_id)
    }
}

// Browsers send `startDate=` for a cleared date input
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Spending grouped under one category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryBreakdown {
    /// `None` for the uncategorized bucket
    pub category_id: Option<Uuid>,
    pub name: String,
    pub color: String,
    pub amount: Decimal,
    /// Share of the total, 0 when nothing was spent
    pub percentage: Decimal,
}

/// Spending on one calendar day (UTC)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// A budget together with its evaluation at request time
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetStatusView {
    pub budget: Budget,
    pub evaluation: BudgetEvaluation,
}

/// Dashboard figures for the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardSummary {
    /// Total over the filtered expenses
    pub total: Decimal,
    /// Spent in the current calendar month
    pub this_month: Decimal,
    pub overall_budget: Option<BudgetStatusView>,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub daily_totals: Vec<DailyTotal>,
}
