use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{
    BudgetItem, BudgetItemsByCategory, BudgetItemsByMonth, Category, CategoryId, CategoryType,
    Cents, CrossTabReport, Expense, ExpenseId, IntegrityReport, ReportQuery,
    validate_amount, validate_description,
};
use crate::storage::{LedgerStore, MemoryStore, Repository};

use super::{AppError, Report, ReportKind, reporting};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, export, tests).
pub struct LedgerService {
    repo: Repository,
}

/// Fields of a new or updated expense, before validation.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub date: DateTime<Utc>,
    pub category_id: CategoryId,
    pub amount_cents: Cents,
    pub description: String,
}

/// Expense together with the category it is filed under.
pub struct ExpenseInfo {
    pub expense: Expense,
    pub category: Category,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path, seeding default categories.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// The underlying store, for running reports directly against it.
    pub fn store(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Category operations
    // ========================

    /// Add a category; ids continue from the highest existing one.
    pub async fn add_category(
        &self,
        description: &str,
        category_type: CategoryType,
    ) -> Result<Category, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::EmptyCategoryDescription);
        }

        let category = self.repo.save_category(description, category_type).await?;
        info!(id = category.id, description = %category.description, "added category");
        Ok(category)
    }

    /// Get a category by id.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, AppError> {
        self.repo
            .get_category(id)
            .await?
            .ok_or(AppError::CategoryNotFound(id))
    }

    /// List all categories in id order.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories().await?)
    }

    /// Change a category's description and type.
    pub async fn update_category(
        &self,
        id: CategoryId,
        description: &str,
        category_type: CategoryType,
    ) -> Result<Category, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::EmptyCategoryDescription);
        }

        let category = Category::new(id, description, category_type);
        if !self.repo.update_category(&category).await? {
            return Err(AppError::CategoryNotFound(id));
        }
        info!(id, description, "updated category");
        Ok(category)
    }

    /// Delete a category that no expense references.
    pub async fn delete_category(&self, id: CategoryId) -> Result<Category, AppError> {
        let category = self.get_category(id).await?;

        let expenses = self.repo.count_expenses_for_category(id).await?;
        if expenses > 0 {
            return Err(AppError::CategoryInUse { id, expenses });
        }

        self.repo.delete_category(id).await?;
        info!(id, "deleted category");
        Ok(category)
    }

    // ========================
    // Expense operations
    // ========================

    /// Record an expense after checking its description and category.
    pub async fn add_expense(&self, input: ExpenseInput) -> Result<Expense, AppError> {
        self.validate_expense(&input).await?;

        let expense = self
            .repo
            .save_expense(
                input.date,
                input.category_id,
                input.amount_cents,
                input.description.trim(),
            )
            .await?;
        info!(
            id = expense.id,
            category_id = expense.category_id,
            amount_cents = expense.amount_cents,
            "added expense"
        );
        Ok(expense)
    }

    /// Get an expense by id.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, AppError> {
        self.repo
            .get_expense(id)
            .await?
            .ok_or(AppError::ExpenseNotFound(id))
    }

    /// Get an expense with its category resolved.
    pub async fn get_expense_info(&self, id: ExpenseId) -> Result<ExpenseInfo, AppError> {
        let expense = self.get_expense(id).await?;
        let category = self.get_category(expense.category_id).await?;
        Ok(ExpenseInfo { expense, category })
    }

    /// List all expenses in id order.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        Ok(self.repo.list_expenses().await?)
    }

    /// Replace every field of an existing expense.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        input: ExpenseInput,
    ) -> Result<Expense, AppError> {
        self.validate_expense(&input).await?;

        let expense = Expense::new(
            id,
            input.date,
            input.category_id,
            input.amount_cents,
            input.description.trim(),
        )?;
        if !self.repo.update_expense(&expense).await? {
            return Err(AppError::ExpenseNotFound(id));
        }
        info!(id, "updated expense");
        // Re-read so the caller sees the stored (second-precision) date
        self.get_expense(id).await
    }

    /// Delete an expense.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<Expense, AppError> {
        let expense = self.get_expense(id).await?;
        self.repo.delete_expense(id).await?;
        info!(id, "deleted expense");
        Ok(expense)
    }

    async fn validate_expense(&self, input: &ExpenseInput) -> Result<(), AppError> {
        validate_description(&input.description)?;
        validate_amount(input.amount_cents)?;
        if self.repo.get_category(input.category_id).await?.is_none() {
            return Err(AppError::InvalidCategory(input.category_id));
        }
        Ok(())
    }

    // ========================
    // Reports
    // ========================

    /// Flat chronological list with running balance.
    pub async fn get_budget_items(&self, query: &ReportQuery) -> Result<Vec<BudgetItem>, AppError> {
        Ok(reporting::get_budget_items(&self.repo, query).await?)
    }

    /// Items grouped by month.
    pub async fn get_budget_items_by_month(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<BudgetItemsByMonth>, AppError> {
        Ok(reporting::get_budget_items_by_month(&self.repo, query).await?)
    }

    /// Items grouped by category.
    pub async fn get_budget_items_by_category(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<BudgetItemsByCategory>, AppError> {
        Ok(reporting::get_budget_items_by_category(&self.repo, query).await?)
    }

    /// Category by month cross-tabulation with grand totals.
    pub async fn get_budget_cross_tab(
        &self,
        query: &ReportQuery,
    ) -> Result<CrossTabReport, AppError> {
        Ok(reporting::get_budget_cross_tab(&self.repo, query).await?)
    }

    /// Compute any report shape.
    pub async fn get_report(&self, kind: ReportKind, query: &ReportQuery) -> Result<Report, AppError> {
        Ok(reporting::build_report(&self.repo, kind, query).await?)
    }

    /// Copy the whole ledger into memory, so several reports can be computed
    /// against one consistent state.
    pub async fn snapshot(&self) -> Result<MemoryStore, AppError> {
        let categories = self.repo.list_categories().await?;
        let expenses = self.repo.list_expenses().await?;
        Ok(MemoryStore::new(categories, expenses))
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check the ledger for rows the write path should have rejected.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let report = self.repo.get_integrity_stats().await?;
        for issue in report.issues() {
            warn!("{}", issue);
        }
        Ok(report)
    }
}
