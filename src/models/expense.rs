use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::category::CategorySummary;
use crate::validation::{validate_amount, validate_not_blank};

/// Expense entity representing a single spending transaction
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub category_id: Uuid,
    /// Populated category, `None` when the category has been deleted
    pub category: Option<CategorySummary>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expense date as sent by clients: a full timestamp or a calendar day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExpenseDate {
    Timestamp(DateTime<Utc>),
    Day(NaiveDate),
}

impl ExpenseDate {
    /// Plain days are stored at midnight UTC
    pub fn into_timestamp(self) -> DateTime<Utc> {
        match self {
            ExpenseDate::Timestamp(at) => at,
            ExpenseDate::Day(day) => day.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// Request payload for creating a new expense
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "amount": "42.50",
    "description": "Weekly groceries",
    "category": "550e8400-e29b-41d4-a716-446655440000",
    "date": "2024-01-15"
}))]
pub struct CreateExpenseRequest {
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String, example = "42.50")]
    pub amount: Decimal,

    #[validate(
        length(max = 500, message = "Description must be at most 500 characters"),
        custom(function = "validate_not_blank")
    )]
    pub description: String,

    /// Category id
    pub category: Uuid,

    /// Defaults to the time of creation
    pub date: Option<ExpenseDate>,
}

/// Request payload for updating an existing expense
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<String>, example = "45.00")]
    pub amount: Option<Decimal>,

    #[validate(
        length(max = 500, message = "Description must be at most 500 characters"),
        custom(function = "validate_not_blank")
    )]
    pub description: Option<String>,

    pub category: Option<Uuid>,

    pub date: Option<ExpenseDate>,
}
