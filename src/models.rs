pub mod auth;
pub mod budget;
pub mod category;
pub mod expense;
pub mod filters;
pub mod user;

pub use auth::{AuthToken, LoginRequest};
pub use budget::{
    Budget, BudgetPeriod, BudgetScope, CreateBudgetRequest, UnknownPeriod, UnknownScope,
    UpdateBudgetRequest,
};
pub use category::{
    Category, CategorySummary, CreateCategoryRequest, UpdateCategoryRequest, DEFAULT_CATEGORIES,
};
pub use expense::{CreateExpenseRequest, Expense, ExpenseDate, UpdateExpenseRequest};
pub use filters::{
    BudgetStatusView, CategoryBreakdown, DailyTotal, DashboardSummary, ExpenseFilters,
};
pub use user::{CreateUserRequest, User};
