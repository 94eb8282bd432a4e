use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, CategoryId, Cents, ExpenseId};

/// Sign applied to the running total when it becomes a flat-list balance.
pub const FLAT_BALANCE_SIGN: Cents = 1;

/// Sign applied to the running total when it becomes a balance inside a
/// month or category group. Grouped balances read as "spent so far".
pub const GROUPED_BALANCE_SIGN: Cents = -1;

/// Key of the trailing grand-totals row of a cross-tabulation.
pub const TOTALS_LABEL: &str = "TOTALS";

/// Date and category restriction shared by every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Inclusive lower bound, 1900-01-01 when absent
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound, 2500-01-01 when absent
    pub end: Option<DateTime<Utc>>,
    /// Only keep expenses filed under this category
    pub category: Option<CategoryId>,
}

impl ReportQuery {
    /// Build a query from the start/end/filter-flag/category-id quadruple.
    /// The category id is ignored unless `filter_flag` is set.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        filter_flag: bool,
        category_id: CategoryId,
    ) -> Self {
        Self {
            start,
            end,
            category: filter_flag.then_some(category_id),
        }
    }

    /// Everything in the ledger.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            category: None,
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category = Some(category_id);
        self
    }

    pub fn start_or_default(&self) -> DateTime<Utc> {
        self.start.unwrap_or_else(default_start)
    }

    pub fn end_or_default(&self) -> DateTime<Utc> {
        self.end.unwrap_or_else(default_end)
    }

    /// True when the row falls inside the date window and passes the category filter.
    pub fn matches(&self, row: &JoinedExpense) -> bool {
        let in_window = row.date >= self.start_or_default() && row.date <= self.end_or_default();
        let in_category = self.category.is_none_or(|id| id == row.category_id);
        in_window && in_category
    }
}

pub fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()
}

pub fn default_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2500, 1, 1, 0, 0, 0).unwrap()
}

/// One expense joined with its category's description, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedExpense {
    pub expense_id: ExpenseId,
    pub category_id: CategoryId,
    pub category: String,
    pub date: DateTime<Utc>,
    pub amount_cents: Cents,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub category_id: CategoryId,
    pub expense_id: ExpenseId,
    pub date: DateTime<Utc>,
    /// Category description
    pub category: String,
    pub short_description: String,
    /// Stored amount, never sign-inverted
    pub amount_cents: Cents,
    /// Running aggregate; meaning depends on the report shape
    pub balance: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemsByMonth {
    /// "YYYY/MM"
    pub month: String,
    pub details: Vec<BudgetItem>,
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemsByCategory {
    pub category: String,
    pub details: Vec<BudgetItem>,
    pub total: Cents,
}

/// One category's slice of a month in the cross-tabulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMonthTotal {
    pub category: String,
    pub total: Cents,
    pub details: Vec<BudgetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCategoryRecord {
    pub month: String,
    /// Month total, equal to the sum of the category totals
    pub total: Cents,
    /// Alphabetical by category
    pub categories: Vec<CategoryMonthTotal>,
}

impl MonthCategoryRecord {
    pub fn category(&self, name: &str) -> Option<&CategoryMonthTotal> {
        self.categories.iter().find(|c| c.category == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGrandTotal {
    pub category: String,
    pub total: Cents,
}

/// Category-by-month matrix plus the grand total of every contributing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTabReport {
    /// Chronological
    pub months: Vec<MonthCategoryRecord>,
    /// Store category order, only categories that contributed
    pub totals: Vec<CategoryGrandTotal>,
}

impl CrossTabReport {
    pub fn grand_total(&self, category: &str) -> Option<Cents> {
        self.totals
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.total)
    }
}

/// "YYYY/MM" key of a date.
pub fn month_key(date: &DateTime<Utc>) -> String {
    date.format("%Y/%m").to_string()
}

/// Filter, order by date and attach the running balance.
///
/// Rows are re-filtered against `query` so a store that over-returns still
/// yields the right list. The sort is stable, so rows sharing a timestamp
/// keep the order the store handed them over in.
pub fn build_budget_items(rows: &[JoinedExpense], query: &ReportQuery) -> Vec<BudgetItem> {
    let mut selected: Vec<&JoinedExpense> = rows.iter().filter(|r| query.matches(r)).collect();
    selected.sort_by_key(|r| r.date);

    let mut total: Cents = 0;
    selected
        .into_iter()
        .map(|row| {
            total += row.amount_cents;
            BudgetItem {
                category_id: row.category_id,
                expense_id: row.expense_id,
                date: row.date,
                category: row.category.clone(),
                short_description: row.description.clone(),
                amount_cents: row.amount_cents,
                balance: FLAT_BALANCE_SIGN * total,
            }
        })
        .collect()
}

/// Group date-ordered items by month, in order of first appearance.
pub fn group_by_month(items: &[BudgetItem]) -> Vec<BudgetItemsByMonth> {
    partition_by(items, |item| month_key(&item.date))
        .into_iter()
        .map(|(month, members)| {
            let (details, total) = accumulate_group(members);
            BudgetItemsByMonth {
                month,
                details,
                total,
            }
        })
        .collect()
}

/// Group items by category description, groups sorted by name.
pub fn group_by_category(items: &[BudgetItem]) -> Vec<BudgetItemsByCategory> {
    let mut groups = partition_by(items, |item| item.category.clone());
    groups.sort_by(|(a, _), (b, _)| compare_category_names(a, b));

    groups
        .into_iter()
        .map(|(category, members)| {
            let (details, total) = accumulate_group(members);
            BudgetItemsByCategory {
                category,
                details,
                total,
            }
        })
        .collect()
}

/// Split each month by category and total every category across all months.
///
/// `categories` fixes the order of the grand totals. Categories that never
/// contributed are left out, as are repeated descriptions.
pub fn build_cross_tab(months: &[BudgetItemsByMonth], categories: &[Category]) -> CrossTabReport {
    let mut totals_per_category: HashMap<String, Cents> = HashMap::new();

    let records = months
        .iter()
        .map(|month| {
            let mut groups = partition_by(&month.details, |item| item.category.clone());
            groups.sort_by(|(a, _), (b, _)| compare_category_names(a, b));

            let splits = groups
                .into_iter()
                .map(|(category, details)| {
                    let total: Cents = details.iter().map(|d| d.amount_cents).sum();
                    *totals_per_category.entry(category.clone()).or_insert(0) += total;
                    CategoryMonthTotal {
                        category,
                        total,
                        details,
                    }
                })
                .collect();

            MonthCategoryRecord {
                month: month.month.clone(),
                total: month.total,
                categories: splits,
            }
        })
        .collect();

    let mut totals: Vec<CategoryGrandTotal> = Vec::new();
    for category in categories {
        if totals.iter().any(|t| t.category == category.description) {
            continue;
        }
        if let Some(&total) = totals_per_category.get(&category.description) {
            totals.push(CategoryGrandTotal {
                category: category.description.clone(),
                total,
            });
        }
    }

    CrossTabReport {
        months: records,
        totals,
    }
}

/// Alphabetical order of category names. Case is ignored; byte order
/// breaks ties between names differing only in case.
pub fn compare_category_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Partition by key, keeping groups in order of first appearance and
/// members in input order.
fn partition_by<F>(items: &[BudgetItem], key: F) -> Vec<(String, Vec<BudgetItem>)>
where
    F: Fn(&BudgetItem) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<BudgetItem>)> = Vec::new();

    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item.clone()),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item.clone()]));
            }
        }
    }

    groups
}

/// Re-balance a group's members against the group's own running total.
fn accumulate_group(members: Vec<BudgetItem>) -> (Vec<BudgetItem>, Cents) {
    let mut total: Cents = 0;
    let details = members
        .into_iter()
        .map(|mut item| {
            total += item.amount_cents;
            item.balance = GROUPED_BALANCE_SIGN * total;
            item
        })
        .collect();
    (details, total)
}
