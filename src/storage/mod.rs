mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;

use crate::domain::{Category, JoinedExpense, ReportQuery};

/// SQL migration for the categories and expenses tables
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Read access the report engine needs from a ledger.
///
/// Each call is one logical read; implementations either hand out a
/// consistent snapshot per call or are read-only for the duration of a report.
#[allow(async_fn_in_trait)]
pub trait LedgerStore {
    /// All categories, in the store's listing order.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Expenses joined to their category and restricted by `query`,
    /// ordered by date. Rows whose category does not resolve are left out.
    async fn list_expenses_joined(&self, query: &ReportQuery) -> Result<Vec<JoinedExpense>>;
}
