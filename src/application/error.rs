use thiserror::Error;

use crate::domain::{CategoryId, ExpenseError, ExpenseId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Invalid category id: {0}")]
    InvalidCategory(CategoryId),

    #[error("Category description cannot be empty")]
    EmptyCategoryDescription,

    #[error(transparent)]
    InvalidExpense(#[from] ExpenseError),

    #[error("Category {id} still has {expenses} expense(s) filed under it")]
    CategoryInUse { id: CategoryId, expenses: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
