use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Category, CategoryId, Expense, ExpenseId, JoinedExpense};

/// Inner-join expenses to their categories.
/// Expenses whose category does not resolve are dropped, not reported.
pub fn join_expenses(categories: &[Category], expenses: &[Expense]) -> Vec<JoinedExpense> {
    let by_id = index_categories(categories);

    expenses
        .iter()
        .filter_map(|expense| {
            by_id.get(&expense.category_id).map(|category| JoinedExpense {
                expense_id: expense.id,
                category_id: category.id,
                category: category.description.clone(),
                date: expense.date,
                amount_cents: expense.amount_cents,
                description: expense.description.clone(),
            })
        })
        .collect()
}

/// Ids of expenses referencing a category that does not exist.
pub fn find_orphaned_expenses(categories: &[Category], expenses: &[Expense]) -> Vec<ExpenseId> {
    let by_id = index_categories(categories);
    expenses
        .iter()
        .filter(|e| !by_id.contains_key(&e.category_id))
        .map(|e| e.id)
        .collect()
}

fn index_categories(categories: &[Category]) -> HashMap<CategoryId, &Category> {
    // First definition wins if a store ever hands over duplicate ids
    let mut by_id = HashMap::with_capacity(categories.len());
    for category in categories {
        by_id.entry(category.id).or_insert(category);
    }
    by_id
}

/// Outcome of a ledger consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub category_count: i64,
    pub expense_count: i64,
    /// Expenses whose category id does not resolve; reports skip them
    pub orphaned_expenses: i64,
    /// Expenses stored with a blank description
    pub blank_descriptions: i64,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.orphaned_expenses == 0 && self.blank_descriptions == 0
    }

    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.orphaned_expenses > 0 {
            issues.push(format!(
                "{} expense(s) reference a missing category",
                self.orphaned_expenses
            ));
        }
        if self.blank_descriptions > 0 {
            issues.push(format!(
                "{} expense(s) have an empty description",
                self.blank_descriptions
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::CategoryType;

    fn expense(id: ExpenseId, category_id: CategoryId) -> Expense {
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        Expense::new(id, date, category_id, -100, "something").unwrap()
    }

    #[test]
    fn test_join_attaches_category_description() {
        let categories = vec![Category::new(3, "Food", CategoryType::Expense)];
        let joined = join_expenses(&categories, &[expense(1, 3)]);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].category, "Food");
        assert_eq!(joined[0].category_id, 3);
        assert_eq!(joined[0].expense_id, 1);
    }

    #[test]
    fn test_join_drops_orphans() {
        let categories = vec![Category::new(3, "Food", CategoryType::Expense)];
        let expenses = vec![expense(1, 3), expense(2, 42), expense(3, 3)];

        let ids: Vec<ExpenseId> = join_expenses(&categories, &expenses)
            .iter()
            .map(|j| j.expense_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(find_orphaned_expenses(&categories, &expenses), vec![2]);
    }

    #[test]
    fn test_integrity_issues() {
        let healthy = IntegrityReport {
            category_count: 16,
            expense_count: 3,
            orphaned_expenses: 0,
            blank_descriptions: 0,
        };
        assert!(healthy.is_healthy());
        assert!(healthy.issues().is_empty());

        let broken = IntegrityReport {
            orphaned_expenses: 2,
            ..healthy
        };
        assert!(!broken.is_healthy());
        assert_eq!(broken.issues().len(), 1);
    }
}
