use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    BudgetItem, BudgetItemsByCategory, BudgetItemsByMonth, CrossTabReport, ReportQuery,
    build_budget_items, build_cross_tab, group_by_category, group_by_month,
};
use crate::storage::LedgerStore;

/// Which of the four report shapes to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Items,
    ByMonth,
    ByCategory,
    CrossTab,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Items => "items",
            ReportKind::ByMonth => "by-month",
            ReportKind::ByCategory => "by-category",
            ReportKind::CrossTab => "cross-tab",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "items" | "list" => Some(ReportKind::Items),
            "by-month" | "month" | "monthly" => Some(ReportKind::ByMonth),
            "by-category" | "category" => Some(ReportKind::ByCategory),
            "cross-tab" | "crosstab" | "matrix" => Some(ReportKind::CrossTab),
            _ => None,
        }
    }
}

/// A computed report of any shape. Serializes as the bare inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Items(Vec<BudgetItem>),
    ByMonth(Vec<BudgetItemsByMonth>),
    ByCategory(Vec<BudgetItemsByCategory>),
    CrossTab(CrossTabReport),
}

/// Chronological list of every matching expense with a running balance.
/// Store failures are returned unchanged.
pub async fn get_budget_items<S: LedgerStore>(
    store: &S,
    query: &ReportQuery,
) -> Result<Vec<BudgetItem>> {
    let rows = store.list_expenses_joined(query).await?;
    let items = build_budget_items(&rows, query);
    debug!(rows = rows.len(), items = items.len(), "built budget items");
    Ok(items)
}

/// Budget items grouped by "YYYY/MM", oldest month first.
pub async fn get_budget_items_by_month<S: LedgerStore>(
    store: &S,
    query: &ReportQuery,
) -> Result<Vec<BudgetItemsByMonth>> {
    let items = get_budget_items(store, query).await?;
    let months = group_by_month(&items);
    debug!(months = months.len(), "grouped budget items by month");
    Ok(months)
}

/// Budget items grouped by category, alphabetically.
pub async fn get_budget_items_by_category<S: LedgerStore>(
    store: &S,
    query: &ReportQuery,
) -> Result<Vec<BudgetItemsByCategory>> {
    let items = get_budget_items(store, query).await?;
    let groups = group_by_category(&items);
    debug!(categories = groups.len(), "grouped budget items by category");
    Ok(groups)
}

/// Month-by-category matrix with per-category grand totals.
pub async fn get_budget_cross_tab<S: LedgerStore>(
    store: &S,
    query: &ReportQuery,
) -> Result<CrossTabReport> {
    let months = get_budget_items_by_month(store, query).await?;
    let categories = store.list_categories().await?;
    let report = build_cross_tab(&months, &categories);
    debug!(
        months = report.months.len(),
        totals = report.totals.len(),
        "built category/month cross-tab"
    );
    Ok(report)
}

/// Compute the report of the requested shape.
pub async fn build_report<S: LedgerStore>(
    store: &S,
    kind: ReportKind,
    query: &ReportQuery,
) -> Result<Report> {
    Ok(match kind {
        ReportKind::Items => Report::Items(get_budget_items(store, query).await?),
        ReportKind::ByMonth => Report::ByMonth(get_budget_items_by_month(store, query).await?),
        ReportKind::ByCategory => {
            Report::ByCategory(get_budget_items_by_category(store, query).await?)
        }
        ReportKind::CrossTab => Report::CrossTab(get_budget_cross_tab(store, query).await?),
    })
}
