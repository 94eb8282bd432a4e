use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::application::{AppError, ExpenseInput, LedgerService, Report, ReportKind};
use crate::domain::{
    BudgetItem, CategoryId, CategoryType, Cents, CrossTabReport, ExpenseId, ReportQuery, TOTALS_LABEL,
    format_cents, parse_cents,
};
use crate::io::{ExportFormat, export_report};

/// HomeBudget - personal budget ledger
#[derive(Parser)]
#[command(name = "homebudget")]
#[command(about = "Record dated expenses by category and browse budget reports")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "homebudget.db", env = "HOMEBUDGET_DB")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database with the default categories
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Expense management commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Show a budget report
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export a budget report to CSV or JSON
    Export {
        /// Report to export: items, by-month, by-category, cross-tab
        report_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        #[command(flatten)]
        filter: ReportFilter,
    },

    /// Verify ledger integrity
    Check,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a new category
    Add {
        /// Category description
        description: String,

        /// Category type: income, expense, credit, savings
        #[arg(short = 't', long = "type", default_value = "expense")]
        category_type: String,
    },

    /// List all categories
    List,

    /// Change a category's description and type
    Update {
        /// Category ID
        id: CategoryId,

        /// New description
        #[arg(short, long)]
        description: String,

        /// New type: income, expense, credit, savings
        #[arg(short = 't', long = "type", default_value = "expense")]
        category_type: String,
    },

    /// Delete a category with no expenses
    Delete {
        /// Category ID
        id: CategoryId,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a new expense
    Add {
        /// Signed amount (e.g., "-45.00" spent, "1200" received)
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category ID
        #[arg(short, long)]
        category: CategoryId,

        /// Description of the expense
        #[arg(short, long)]
        description: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Replace an existing expense
    Update {
        /// Expense ID
        id: ExpenseId,

        /// Signed amount
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Category ID
        #[arg(short, long)]
        category: CategoryId,

        /// Description of the expense
        #[arg(short, long)]
        description: String,

        /// Date of the expense (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: ExpenseId,
    },

    /// Show a single expense
    Show {
        /// Expense ID
        id: ExpenseId,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Chronological list with running balance
    Items(ReportArgs),

    /// Items grouped by month
    ByMonth(ReportArgs),

    /// Items grouped by category
    ByCategory(ReportArgs),

    /// Category by month totals
    CrossTab(ReportArgs),
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filter: ReportFilter,

    /// Output format: table, json, csv
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args)]
pub struct ReportFilter {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Only include this category ID
    #[arg(long)]
    pub category: Option<CategoryId>,
}

impl ReportFilter {
    fn to_query(&self) -> Result<ReportQuery> {
        let start = self.from.as_deref().map(parse_date).transpose()?;
        let end = self.to.as_deref().map(parse_date).transpose()?;
        let mut query = ReportQuery::between(start, end);
        if let Some(id) = self.category {
            query = query.with_category(id);
        }
        Ok(query)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                let service = LedgerService::init(&self.database).await?;
                let count = service.list_categories().await?.len();
                println!("Database initialized: {} ({} categories)", self.database, count);
            }

            Commands::Category(category_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_category_command(&service, category_cmd).await?;
            }

            Commands::Expense(expense_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_expense_command(&service, expense_cmd).await?;
            }

            Commands::Report(report_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_report_command(&service, report_cmd).await?;
            }

            Commands::Export {
                report_type,
                output,
                format,
                filter,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &report_type, output.as_deref(), &format, &filter)
                    .await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

async fn run_category_command(service: &LedgerService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::Add {
            description,
            category_type,
        } => {
            let category_type = parse_category_type(&category_type)?;
            let category = service.add_category(&description, category_type).await?;
            println!(
                "Added category {}: {} ({})",
                category.id, category.description, category.category_type
            );
        }

        CategoryCommands::List => {
            let categories = service.list_categories().await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:>4}  {:<25} {:<10}", "ID", "DESCRIPTION", "TYPE");
                println!("{}", "-".repeat(41));
                for category in categories {
                    println!(
                        "{:>4}  {:<25} {:<10}",
                        category.id,
                        truncate(&category.description, 25),
                        category.category_type
                    );
                }
            }
        }

        CategoryCommands::Update {
            id,
            description,
            category_type,
        } => {
            let category_type = parse_category_type(&category_type)?;
            let category = service
                .update_category(id, &description, category_type)
                .await?;
            println!(
                "Updated category {}: {} ({})",
                category.id, category.description, category.category_type
            );
        }

        CategoryCommands::Delete { id } => {
            let category = service.delete_category(id).await?;
            println!("Deleted category {}: {}", category.id, category.description);
        }
    }

    Ok(())
}

async fn run_expense_command(service: &LedgerService, cmd: ExpenseCommands) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            description,
            date,
        } => {
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => today()?,
            };
            let input = ExpenseInput {
                date,
                category_id: category,
                amount_cents: parse_amount(&amount)?,
                description,
            };
            let expense = service.add_expense(input).await?;
            println!(
                "Recorded expense {}: {} on {} ({})",
                expense.id,
                format_cents(expense.amount_cents),
                expense.date.format("%Y-%m-%d"),
                expense.description
            );
        }

        ExpenseCommands::Update {
            id,
            amount,
            category,
            description,
            date,
        } => {
            let input = ExpenseInput {
                date: parse_date(&date)?,
                category_id: category,
                amount_cents: parse_amount(&amount)?,
                description,
            };
            let expense = service.update_expense(id, input).await?;
            println!(
                "Updated expense {}: {} on {} ({})",
                expense.id,
                format_cents(expense.amount_cents),
                expense.date.format("%Y-%m-%d"),
                expense.description
            );
        }

        ExpenseCommands::Delete { id } => {
            let expense = service.delete_expense(id).await?;
            println!(
                "Deleted expense {}: {} ({})",
                expense.id,
                format_cents(expense.amount_cents),
                expense.description
            );
        }

        ExpenseCommands::Show { id } => {
            let info = service.get_expense_info(id).await?;
            println!("Expense: {}", info.expense.id);
            println!("  Date:        {}", info.expense.date.format("%Y-%m-%d %H:%M:%S"));
            println!(
                "  Category:    {} ({}, {})",
                info.category.description, info.category.id, info.category.category_type
            );
            println!("  Amount:      {}", format_cents(info.expense.amount_cents));
            println!("  Description: {}", info.expense.description);
        }
    }

    Ok(())
}

async fn run_report_command(service: &LedgerService, cmd: ReportCommands) -> Result<()> {
    let (kind, args) = match cmd {
        ReportCommands::Items(args) => (ReportKind::Items, args),
        ReportCommands::ByMonth(args) => (ReportKind::ByMonth, args),
        ReportCommands::ByCategory(args) => (ReportKind::ByCategory, args),
        ReportCommands::CrossTab(args) => (ReportKind::CrossTab, args),
    };

    let query = args.filter.to_query()?;
    let report = service.get_report(kind, &query).await?;

    match args.format.as_str() {
        "json" => {
            export_report(&report, ExportFormat::Json, std::io::stdout().lock())?;
        }
        "csv" => {
            export_report(&report, ExportFormat::Csv, std::io::stdout().lock())?;
        }
        _ => print_report_table(&report),
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    report_type: &str,
    output: Option<&str>,
    format: &str,
    filter: &ReportFilter,
) -> Result<()> {
    let kind = ReportKind::from_str(report_type).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown report type '{}'. Use: items, by-month, by-category, cross-tab",
            report_type
        )
    })?;
    let format = ExportFormat::from_str(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown format '{}'. Use: csv, json", format))?;

    let query = filter.to_query()?;
    let report = service.get_report(kind, &query).await?;

    let count = match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {}", path))?;
            export_report(&report, format, file)?
        }
        None => export_report(&report, format, std::io::stdout().lock())?,
    };

    eprintln!("Exported {} {} record(s)", count, kind.as_str());
    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    let report = service.check_integrity().await?;

    println!("Ledger Integrity Check");
    println!("  Categories: {}", report.category_count);
    println!("  Expenses:   {}", report.expense_count);

    if report.is_healthy() {
        println!("\nAll checks passed.");
    } else {
        println!("\nIssues found:");
        for issue in report.issues() {
            println!("  - {}", issue);
        }
    }

    Ok(())
}

fn print_report_table(report: &Report) {
    match report {
        Report::Items(items) => {
            if items.is_empty() {
                println!("No expenses found.");
                return;
            }
            print_item_header();
            for item in items {
                print_item_row(item);
            }
        }

        Report::ByMonth(groups) => {
            if groups.is_empty() {
                println!("No expenses found.");
                return;
            }
            for group in groups {
                println!("{}", group.month);
                print_item_header();
                for item in &group.details {
                    print_item_row(item);
                }
                println!("{:<64} {:>12}", "TOTAL", format_cents(group.total));
                println!();
            }
        }

        Report::ByCategory(groups) => {
            if groups.is_empty() {
                println!("No expenses found.");
                return;
            }
            for group in groups {
                println!("{}", group.category);
                print_item_header();
                for item in &group.details {
                    print_item_row(item);
                }
                println!("{:<64} {:>12}", "TOTAL", format_cents(group.total));
                println!();
            }
        }

        Report::CrossTab(cross_tab) => print_cross_tab(cross_tab),
    }
}

fn print_item_header() {
    println!(
        "{:<10} {:>5} {:<18} {:<28} {:>12} {:>12}",
        "DATE", "ID", "CATEGORY", "DESCRIPTION", "AMOUNT", "BALANCE"
    );
    println!("{}", "-".repeat(90));
}

fn print_item_row(item: &BudgetItem) {
    println!(
        "{:<10} {:>5} {:<18} {:<28} {:>12} {:>12}",
        item.date.format("%Y-%m-%d"),
        item.expense_id,
        truncate(&item.category, 18),
        truncate(&item.short_description, 28),
        format_cents(item.amount_cents),
        format_cents(item.balance)
    );
}

fn print_cross_tab(cross_tab: &CrossTabReport) {
    let columns: Vec<&str> = cross_tab.totals.iter().map(|t| t.category.as_str()).collect();

    print!("{:<8}", "MONTH");
    for column in &columns {
        print!(" {:>14}", truncate(column, 14));
    }
    println!(" {:>14}", "TOTAL");
    println!("{}", "-".repeat(8 + (columns.len() + 1) * 15));

    for record in &cross_tab.months {
        print!("{:<8}", record.month);
        for column in &columns {
            let cell = record
                .category(column)
                .map(|c| format_cents(c.total))
                .unwrap_or_default();
            print!(" {:>14}", cell);
        }
        println!(" {:>14}", format_cents(record.total));
    }

    println!("{}", "-".repeat(8 + (columns.len() + 1) * 15));
    print!("{:<8}", TOTALS_LABEL);
    let mut grand_total = 0;
    for total in &cross_tab.totals {
        grand_total += total.total;
        print!(" {:>14}", format_cents(total.total));
    }
    println!(" {:>14}", format_cents(grand_total));
}

fn parse_category_type(s: &str) -> Result<CategoryType> {
    CategoryType::from_str(s).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid category type '{}'. Use: income, expense, credit, savings",
            s
        )
    })
}

fn parse_amount(s: &str) -> Result<Cents> {
    let cents = parse_cents(s).map_err(|e| AppError::InvalidAmount(format!("'{}': {}", s, e)))?;
    Ok(cents)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Midnight UTC of the current day, the instant `parse_date` gives for today.
fn today() -> Result<DateTime<Utc>> {
    let midnight = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    use chrono::NaiveDate;

    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))?;
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JoinedExpense;

    #[test]
    fn test_cli_parses_report_filter() {
        let cli = Cli::try_parse_from([
            "homebudget",
            "report",
            "by-month",
            "--from",
            "2020-01-01",
            "--to",
            "2020-12-31",
            "--category",
            "14",
        ])
        .unwrap();

        let Commands::Report(ReportCommands::ByMonth(args)) = cli.command else {
            panic!("expected report by-month");
        };
        let query = args.filter.to_query().unwrap();
        assert_eq!(query.category, Some(14));
        assert_eq!(query.start.unwrap().format("%Y-%m-%d").to_string(), "2020-01-01");
        assert_eq!(args.format, "table");
    }

    #[test]
    fn test_cli_accepts_negative_amount() {
        let cli = Cli::try_parse_from([
            "homebudget",
            "expense",
            "add",
            "-45.00",
            "--category",
            "14",
            "--description",
            "hamburger",
        ])
        .unwrap();

        let Commands::Expense(ExpenseCommands::Add { amount, .. }) = cli.command else {
            panic!("expected expense add");
        };
        assert_eq!(parse_amount(&amount).unwrap(), -4500);
    }

    #[test]
    fn test_undated_expense_within_report_ending_today() {
        let recorded = today().unwrap();
        let row = JoinedExpense {
            expense_id: 1,
            category_id: 14,
            category: "Eating Out".to_string(),
            date: recorded,
            amount_cents: -4500,
            description: "hamburger".to_string(),
        };

        let day = recorded.format("%Y-%m-%d").to_string();
        let filter = ReportFilter {
            from: Some(day.clone()),
            to: Some(day),
            category: None,
        };
        let query = filter.to_query().unwrap();

        assert_eq!(query.end, Some(recorded));
        assert!(query.matches(&row));
    }

    #[test]
    fn test_parse_date_rejects_bad_input() {
        assert!(parse_date("2020-13-01").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Rent", 10), "Rent");
        assert_eq!(truncate("Medical Expenses", 10), "Medical...");
    }
}
