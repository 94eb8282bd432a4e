use anyhow::Result;

use crate::domain::{
    Category, Expense, IntegrityReport, JoinedExpense, ReportQuery, find_orphaned_expenses,
    join_expenses,
};

use super::LedgerStore;

/// Read-only ledger snapshot held in memory.
///
/// Used for fixture data and for computing reports against a frozen copy
/// of a live ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

impl MemoryStore {
    pub fn new(categories: Vec<Category>, expenses: Vec<Expense>) -> Self {
        Self {
            categories,
            expenses,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Same checks as the SQLite integrity query, over the held rows.
    pub fn integrity_report(&self) -> IntegrityReport {
        let orphaned = find_orphaned_expenses(&self.categories, &self.expenses);
        let blank = self
            .expenses
            .iter()
            .filter(|e| e.description.trim().is_empty())
            .count();

        IntegrityReport {
            category_count: self.categories.len() as i64,
            expense_count: self.expenses.len() as i64,
            orphaned_expenses: orphaned.len() as i64,
            blank_descriptions: blank as i64,
        }
    }
}

impl LedgerStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn list_expenses_joined(&self, query: &ReportQuery) -> Result<Vec<JoinedExpense>> {
        let mut rows: Vec<JoinedExpense> = join_expenses(&self.categories, &self.expenses)
            .into_iter()
            .filter(|row| query.matches(row))
            .collect();
        rows.sort_by_key(|row| (row.date, row.expense_id));
        Ok(rows)
    }
}
