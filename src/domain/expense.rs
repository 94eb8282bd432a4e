use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CategoryId, Cents, MAX_AMOUNT_CENTS};

pub type ExpenseId = i64;

/// A dated, signed money movement filed under one category.
/// Negative amounts are money spent, positive amounts money received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// When the movement happened
    pub date: DateTime<Utc>,
    /// Must reference an existing category; checked by the store on write
    pub category_id: CategoryId,
    pub amount_cents: Cents,
    /// Never empty
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseError {
    #[error("expense description cannot be empty")]
    EmptyDescription,
    #[error("expense amount {0} cents is out of range")]
    AmountOutOfRange(Cents),
}

impl Expense {
    pub fn new(
        id: ExpenseId,
        date: DateTime<Utc>,
        category_id: CategoryId,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Result<Self, ExpenseError> {
        let description = description.into();
        validate_description(&description)?;
        validate_amount(amount_cents)?;
        Ok(Self {
            id,
            date,
            category_id,
            amount_cents,
            description,
        })
    }
}

/// Reject blank descriptions (whitespace only counts as blank).
pub fn validate_description(description: &str) -> Result<(), ExpenseError> {
    if description.trim().is_empty() {
        return Err(ExpenseError::EmptyDescription);
    }
    Ok(())
}

/// Reject amounts whose magnitude exceeds `MAX_AMOUNT_CENTS`.
pub fn validate_amount(amount_cents: Cents) -> Result<(), ExpenseError> {
    if amount_cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
        return Err(ExpenseError::AmountOutOfRange(amount_cents));
    }
    Ok(())
}
