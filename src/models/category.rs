use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_hex_color, validate_not_blank};

/// Color given to categories created without one
pub const DEFAULT_CATEGORY_COLOR: &str = "#FF6B35";

/// Color used to present expenses whose category no longer exists
pub const UNCATEGORIZED_COLOR: &str = "#94a3b8";

pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Name/color pairs seeded for a user that has no categories yet
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "#ef4444"),
    ("Fuel", "#f59e0b"),
    ("Dress", "#8b5cf6"),
    ("Groceries", "#10b981"),
    ("Transport", "#3b82f6"),
    ("Entertainment", "#ec4899"),
    ("Bills", "#6366f1"),
    ("Healthcare", "#14b8a6"),
    ("Shopping", "#f97316"),
    ("Others", "#94a3b8"),
];

/// Category entity: a named, colored tag owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `{id, name, color}` view embedded in expenses and budgets
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
        }
    }
}

/// Request payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Coffee",
    "color": "#a16207"
}))]
pub struct CreateCategoryRequest {
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(custom(function = "validate_hex_color"))]
    #[schema(example = "#a16207")]
    pub color: Option<String>,
}

/// Request payload for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}
