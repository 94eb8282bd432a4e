// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use homebudget::application::{ExpenseInput, LedgerService};
use homebudget::domain::{Category, CategoryId, CategoryType, Cents, Expense};
use tempfile::TempDir;

/// Id of "Eating Out" among the default categories
pub const EATING_OUT: CategoryId = 14;
/// Id of "Rent" among the default categories
pub const RENT: CategoryId = 2;
/// Id of "Clothes" among the default categories
pub const CLOTHES: CategoryId = 10;
/// Id of "Income" among the default categories
pub const INCOME: CategoryId = 16;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Record an expense through the service
pub async fn record(
    service: &LedgerService,
    date: &str,
    category_id: CategoryId,
    amount_cents: Cents,
    description: &str,
) -> Result<Expense> {
    Ok(service
        .add_expense(ExpenseInput {
            date: parse_date(date),
            category_id,
            amount_cents,
            description: description.to_string(),
        })
        .await?)
}

/// Test fixture: a few months of household spending
pub struct SampleLedger;

impl SampleLedger {
    /// Jan: two meals out and clothes; Feb: rent, clothes, a meal out;
    /// Mar: salary only.
    pub async fn populate(service: &LedgerService) -> Result<()> {
        record(service, "2020-01-11", EATING_OUT, -4500, "hamburger").await?;
        record(service, "2020-01-12", EATING_OUT, -2500, "pizza").await?;
        record(service, "2020-01-20", CLOTHES, -1500, "socks").await?;
        record(service, "2020-02-01", RENT, -100000, "february rent").await?;
        record(service, "2020-02-10", CLOTHES, -3000, "shirt").await?;
        record(service, "2020-02-14", EATING_OUT, -6000, "valentine dinner").await?;
        record(service, "2020-03-01", INCOME, 250000, "salary").await?;
        Ok(())
    }

    /// Same data as `populate`, as plain values for a memory store
    pub fn categories() -> Vec<Category> {
        vec![
            Category::new(RENT, "Rent", CategoryType::Expense),
            Category::new(CLOTHES, "Clothes", CategoryType::Expense),
            Category::new(EATING_OUT, "Eating Out", CategoryType::Expense),
            Category::new(INCOME, "Income", CategoryType::Income),
            Category::new(15, "Savings", CategoryType::Savings),
        ]
    }

    pub fn expenses() -> Vec<Expense> {
        let rows = [
            (1, "2020-01-11", EATING_OUT, -4500, "hamburger"),
            (2, "2020-01-12", EATING_OUT, -2500, "pizza"),
            (3, "2020-01-20", CLOTHES, -1500, "socks"),
            (4, "2020-02-01", RENT, -100000, "february rent"),
            (5, "2020-02-10", CLOTHES, -3000, "shirt"),
            (6, "2020-02-14", EATING_OUT, -6000, "valentine dinner"),
            (7, "2020-03-01", INCOME, 250000, "salary"),
        ];
        rows.into_iter()
            .map(|(id, date, cat, amount, desc)| {
                Expense::new(id, parse_date(date), cat, amount, desc).unwrap()
            })
            .collect()
    }
}
