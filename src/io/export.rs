use anyhow::Result;
use std::io::Write;

use crate::application::Report;
use crate::domain::{BudgetItem, CrossTabReport, TOTALS_LABEL, format_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Write a report in the requested format. Returns the number of data rows
/// written (CSV) or top-level entries (JSON).
pub fn export_report<W: Write>(report: &Report, format: ExportFormat, writer: W) -> Result<usize> {
    match format {
        ExportFormat::Csv => export_report_csv(report, writer),
        ExportFormat::Json => export_report_json(report, writer),
    }
}

/// Export a report as pretty-printed JSON.
pub fn export_report_json<W: Write>(report: &Report, mut writer: W) -> Result<usize> {
    let json = serde_json::to_string_pretty(report)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(match report {
        Report::Items(items) => items.len(),
        Report::ByMonth(groups) => groups.len(),
        Report::ByCategory(groups) => groups.len(),
        Report::CrossTab(cross_tab) => cross_tab.months.len() + 1,
    })
}

/// Export a report as CSV.
///
/// Grouped reports flatten to one line per item, prefixed with the group key
/// and followed by the group total. The cross-tab becomes a month-by-category
/// matrix ending with the TOTALS line.
pub fn export_report_csv<W: Write>(report: &Report, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let count = match report {
        Report::Items(items) => {
            csv_writer.write_record(ITEM_HEADER)?;
            for item in items {
                csv_writer.write_record(item_record(item))?;
            }
            items.len()
        }
        Report::ByMonth(groups) => {
            let mut header = vec!["month"];
            header.extend_from_slice(ITEM_HEADER);
            header.push("group_total");
            csv_writer.write_record(&header)?;

            let mut count = 0;
            for group in groups {
                for item in &group.details {
                    let mut record = vec![group.month.clone()];
                    record.extend(item_record(item));
                    record.push(format_cents(group.total));
                    csv_writer.write_record(&record)?;
                    count += 1;
                }
            }
            count
        }
        Report::ByCategory(groups) => {
            let mut header = vec!["group"];
            header.extend_from_slice(ITEM_HEADER);
            header.push("group_total");
            csv_writer.write_record(&header)?;

            let mut count = 0;
            for group in groups {
                for item in &group.details {
                    let mut record = vec![group.category.clone()];
                    record.extend(item_record(item));
                    record.push(format_cents(group.total));
                    csv_writer.write_record(&record)?;
                    count += 1;
                }
            }
            count
        }
        Report::CrossTab(cross_tab) => write_cross_tab(&mut csv_writer, cross_tab)?,
    };

    csv_writer.flush()?;
    Ok(count)
}

const ITEM_HEADER: &[&str] = &[
    "date",
    "expense_id",
    "category_id",
    "category",
    "description",
    "amount",
    "balance",
];

fn item_record(item: &BudgetItem) -> Vec<String> {
    vec![
        item.date.format("%Y-%m-%d").to_string(),
        item.expense_id.to_string(),
        item.category_id.to_string(),
        item.category.clone(),
        item.short_description.clone(),
        format_cents(item.amount_cents),
        format_cents(item.balance),
    ]
}

const MONTH_COLUMN: &str = "month";
const TOTAL_COLUMN: &str = "total";

/// Header for a category column. Names clashing with the fixed columns
/// get a `category:` prefix.
fn category_column(name: &str) -> String {
    if name.eq_ignore_ascii_case(MONTH_COLUMN) || name.eq_ignore_ascii_case(TOTAL_COLUMN) {
        format!("category:{}", name)
    } else {
        name.to_string()
    }
}

fn write_cross_tab<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    cross_tab: &CrossTabReport,
) -> Result<usize> {
    let columns: Vec<&str> = cross_tab.totals.iter().map(|t| t.category.as_str()).collect();

    let mut header = vec![MONTH_COLUMN.to_string()];
    header.extend(columns.iter().map(|c| category_column(c)));
    header.push(TOTAL_COLUMN.to_string());
    csv_writer.write_record(&header)?;

    for record in &cross_tab.months {
        let mut row = vec![record.month.clone()];
        for column in &columns {
            row.push(
                record
                    .category(column)
                    .map(|c| format_cents(c.total))
                    .unwrap_or_default(),
            );
        }
        row.push(format_cents(record.total));
        csv_writer.write_record(&row)?;
    }

    let grand_total: i64 = cross_tab.totals.iter().map(|t| t.total).sum();
    let mut totals_row = vec![TOTALS_LABEL.to_string()];
    totals_row.extend(cross_tab.totals.iter().map(|t| format_cents(t.total)));
    totals_row.push(format_cents(grand_total));
    csv_writer.write_record(&totals_row)?;

    Ok(cross_tab.months.len() + 1)
}
