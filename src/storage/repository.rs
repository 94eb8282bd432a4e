use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::domain::{
    Category, CategoryId, CategoryType, Cents, DEFAULT_CATEGORIES, Expense, ExpenseId,
    IntegrityReport, JoinedExpense, ReportQuery,
};

use super::{LedgerStore, MIGRATION_001_INITIAL};

/// SQLite-backed ledger holding categories and expenses.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate + default categories).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        repo.seed_default_categories().await?;
        Ok(repo)
    }

    /// Insert the default category list, only into an empty categories table.
    pub async fn seed_default_categories(&self) -> Result<usize> {
        let existing: i64 = sqlx::query("SELECT COUNT(*) as count FROM categories")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count categories")?
            .get("count");
        if existing > 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (description, category_type) in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (description, category_type) VALUES (?, ?)")
                .bind(description)
                .bind(category_type.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to seed category {}", description))?;
        }
        tx.commit().await.context("Failed to commit default categories")?;

        info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
        Ok(DEFAULT_CATEGORIES.len())
    }

    // ========================
    // Category operations
    // ========================

    /// Save a new category; the id is assigned by the database.
    pub async fn save_category(
        &self,
        description: &str,
        category_type: CategoryType,
    ) -> Result<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (description, category_type)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(description)
        .bind(category_type.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save category")?;

        Ok(Category::new(row.get("id"), description, category_type))
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, description, category_type FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// Overwrite description and type. Returns false when the id is unknown.
    pub async fn update_category(&self, category: &Category) -> Result<bool> {
        let result =
            sqlx::query("UPDATE categories SET description = ?, category_type = ? WHERE id = ?")
                .bind(&category.description)
                .bind(category.category_type.as_str())
                .bind(category.id)
                .execute(&self.pool)
                .await
                .context("Failed to update category")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a category. Returns false when the id is unknown.
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of expenses filed under a category.
    pub async fn count_expenses_for_category(&self, id: CategoryId) -> Result<i64> {
        let count = sqlx::query("SELECT COUNT(*) as count FROM expenses WHERE category_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count expenses for category")?
            .get("count");
        Ok(count)
    }

    fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
        let type_str: String = row.get("category_type");
        Ok(Category {
            id: row.get("id"),
            description: row.get("description"),
            category_type: CategoryType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid category type: {}", type_str))?,
        })
    }

    // ========================
    // Expense operations
    // ========================

    /// Save a new expense; the id is assigned by the database.
    pub async fn save_expense(
        &self,
        date: DateTime<Utc>,
        category_id: CategoryId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Expense> {
        let row = sqlx::query(
            r#"
            INSERT INTO expenses (category_id, amount_cents, date, description)
            VALUES (?, ?, ?, ?)
            RETURNING id, date
            "#,
        )
        .bind(category_id)
        .bind(amount_cents)
        .bind(encode_date(&date))
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save expense")?;

        let stored_date: String = row.get("date");
        Ok(Expense {
            id: row.get("id"),
            date: decode_date(&stored_date)?,
            category_id,
            amount_cents,
            description: description.to_string(),
        })
    }

    /// Get an expense by ID.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, date, description
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch expense")?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    /// List all expenses in id order, orphans included.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, date, description
            FROM expenses
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// Overwrite every field of an expense. Returns false when the id is unknown.
    pub async fn update_expense(&self, expense: &Expense) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET category_id = ?, amount_cents = ?, date = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(expense.category_id)
        .bind(expense.amount_cents)
        .bind(encode_date(&expense.date))
        .bind(&expense.description)
        .bind(expense.id)
        .execute(&self.pool)
        .await
        .context("Failed to update expense")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an expense. Returns false when the id is unknown.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete expense")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let date_str: String = row.get("date");
        Ok(Expense {
            id: row.get("id"),
            date: decode_date(&date_str)?,
            category_id: row.get("category_id"),
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
        })
    }

    fn row_to_joined(row: &sqlx::sqlite::SqliteRow) -> Result<JoinedExpense> {
        let date_str: String = row.get("date");
        Ok(JoinedExpense {
            expense_id: row.get("expense_id"),
            category_id: row.get("category_id"),
            category: row.get("category"),
            date: decode_date(&date_str)?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
        })
    }

    // ========================
    // Integrity operations
    // ========================

    /// Count references and descriptions the write path should have rejected.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityReport> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM categories) as category_count,
                (SELECT COUNT(*) FROM expenses) as expense_count,
                (SELECT COUNT(*) FROM expenses e
                    WHERE NOT EXISTS (SELECT 1 FROM categories c WHERE c.id = e.category_id)
                ) as orphaned,
                (SELECT COUNT(*) FROM expenses WHERE TRIM(description) = '') as blank
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute integrity stats")?;

        Ok(IntegrityReport {
            category_count: row.get("category_count"),
            expense_count: row.get("expense_count"),
            orphaned_expenses: row.get("orphaned"),
            blank_descriptions: row.get("blank"),
        })
    }
}

impl LedgerStore for Repository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, description, category_type FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn list_expenses_joined(&self, query: &ReportQuery) -> Result<Vec<JoinedExpense>> {
        let mut sql = String::from(
            r#"
            SELECT e.id as expense_id, e.category_id, c.description as category,
                   e.date, e.amount_cents, e.description
            FROM expenses e
            INNER JOIN categories c ON c.id = e.category_id
            WHERE e.date >= ? AND e.date <= ?
            "#,
        );
        if query.category.is_some() {
            sql.push_str(" AND e.category_id = ?");
        }
        sql.push_str(" ORDER BY e.date, e.id");

        let start = encode_date(&query.start_or_default());
        let end = encode_date(&query.end_or_default());

        let mut sql_query = sqlx::query(&sql).bind(&start).bind(&end);
        if let Some(category_id) = query.category {
            sql_query = sql_query.bind(category_id);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list joined expenses")?;

        debug!(rows = rows.len(), %start, %end, category = ?query.category, "joined expense query");
        rows.iter().map(Self::row_to_joined).collect()
    }
}

/// Dates are stored as second-precision RFC 3339 in UTC ("2020-01-11T00:00:00Z"),
/// which keeps lexicographic and chronological order identical.
fn encode_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_date(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid stored date: {}", s))?
        .with_timezone(&Utc))
}
