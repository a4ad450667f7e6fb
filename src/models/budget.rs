use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::category::CategorySummary;
use crate::validation::validate_amount;

/// Whether a budget covers all spending or a single category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BudgetScope {
    Overall,
    Category,
}

impl BudgetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetScope::Overall => "overall",
            BudgetScope::Category => "category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown budget scope '{0}', expected overall or category")]
pub struct UnknownScope(pub String);

impl FromStr for BudgetScope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overall" => Ok(BudgetScope::Overall),
            "category" => Ok(BudgetScope::Category),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Recurrence cadence that defines a budget's active window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Weekly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown budget period '{0}', expected monthly, weekly or yearly")]
pub struct UnknownPeriod(pub String);

impl FromStr for BudgetPeriod {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "weekly" => Ok(BudgetPeriod::Weekly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}

/// Budget entity: a spending limit over a recurring period
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scope: BudgetScope,
    /// Set iff `scope` is `category`
    pub category_id: Option<Uuid>,
    pub category: Option<CategorySummary>,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a budget
///
/// Creating an overall budget for a period that already has one updates
/// the existing budget's amount instead.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "scope": "category",
    "category": "550e8400-e29b-41d4-a716-446655440000",
    "amount": "250.00",
    "period": "monthly"
}))]
pub struct CreateBudgetRequest {
    #[serde(alias = "type")]
    pub scope: BudgetScope,

    /// Required when `scope` is `category`
    pub category: Option<Uuid>,

    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,

    #[serde(default)]
    pub period: BudgetPeriod,
}

/// Request payload for updating a budget
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBudgetRequest {
    #[serde(alias = "type")]
    pub scope: Option<BudgetScope>,

    pub category: Option<Uuid>,

    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<String>, example = "300.00")]
    pub amount: Option<Decimal>,

    pub period: Option<BudgetPeriod>,
}
