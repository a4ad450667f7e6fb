pub mod auth_service;
pub mod budget_evaluator;
pub mod budget_service;
pub mod category_service;
pub mod dashboard_service;
pub mod expense_service;
pub mod reports;
