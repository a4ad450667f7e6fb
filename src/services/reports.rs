//! Grouping helpers behind the dashboard and its charts.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::category::{UNCATEGORIZED_COLOR, UNCATEGORIZED_NAME};
use crate::models::expense::Expense;
use crate::models::filters::{CategoryBreakdown, DailyTotal};
use crate::services::budget_evaluator;

pub fn total_spent(expenses: &[Expense]) -> Decimal {
    budget_evaluator::spent(expenses)
}

/// Spending per category, largest first.
///
/// Expenses whose category was deleted share a single uncategorized bucket.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryBreakdown> {
    let mut buckets: HashMap<Option<Uuid>, CategoryBreakdown> = HashMap::new();

    for expense in expenses {
        let key = expense.category.as_ref().map(|c| c.id);
        let bucket = buckets.entry(key).or_insert_with(|| match &expense.category {
            Some(category) => CategoryBreakdown {
                category_id: Some(category.id),
                name: category.name.clone(),
                color: category.color.clone(),
                amount: Decimal::ZERO,
                percentage: Decimal::ZERO,
            },
            None => CategoryBreakdown {
                category_id: None,
                name: UNCATEGORIZED_NAME.to_string(),
                color: UNCATEGORIZED_COLOR.to_string(),
                amount: Decimal::ZERO,
                percentage: Decimal::ZERO,
            },
        });
        bucket.amount += expense.amount;
    }

    let total = total_spent(expenses);
    let mut breakdown: Vec<CategoryBreakdown> = buckets
        .into_values()
        .map(|mut bucket| {
            bucket.percentage = budget_evaluator::percentage(bucket.amount, total).round_dp(2);
            bucket
        })
        .collect();

    // name as tie-breaker keeps the order stable across HashMap iteration
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    breakdown
}

/// Spending per UTC calendar day, oldest first
pub fn daily_totals(expenses: &[Expense]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for expense in expenses {
        *days.entry(expense.date.date_naive()).or_insert(Decimal::ZERO) += expense.amount;
    }

    days.into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}
