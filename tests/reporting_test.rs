mod common;

use anyhow::Result;
use common::{CLOTHES, EATING_OUT, INCOME, RENT, SampleLedger, parse_date, record, test_service};
use homebudget::application::{Report, ReportKind};
use homebudget::domain::{CategoryType, Cents, ExpenseId, ReportQuery};

#[tokio::test]
async fn test_budget_items_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;

    record(&service, "2020-01-11", EATING_OUT, -4500, "hamburger").await?;
    record(&service, "2020-01-12", EATING_OUT, -2500, "pizza").await?;

    let query = ReportQuery::new(None, None, false, 0);
    let items = service.get_budget_items(&query).await?;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].short_description, "hamburger");
    assert_eq!(items[0].category, "Eating Out");
    assert_eq!(items[0].amount_cents, -4500);
    assert_eq!(items[0].balance, -4500);
    assert_eq!(items[1].balance, -7000);

    let months = service.get_budget_items_by_month(&query).await?;
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].month, "2020/01");
    assert_eq!(months[0].total, -7000);
    assert_eq!(months[0].details[0].balance, 4500);
    assert_eq!(months[0].details[1].balance, 7000);

    Ok(())
}

#[tokio::test]
async fn test_budget_items_filter_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;

    record(&service, "2020-01-11", EATING_OUT, -4500, "hamburger").await?;
    record(&service, "2020-01-12", EATING_OUT, -2500, "pizza").await?;

    let matching = service
        .get_budget_items(&ReportQuery::new(None, None, true, EATING_OUT))
        .await?;
    assert_eq!(matching.len(), 2);

    let other = service
        .get_budget_items(&ReportQuery::new(None, None, true, RENT))
        .await?;
    assert!(other.is_empty());

    // The category id means nothing without the filter flag
    let unfiltered = service
        .get_budget_items(&ReportQuery::new(None, None, false, RENT))
        .await?;
    assert_eq!(unfiltered.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_budget_items_sorted_with_running_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Recorded out of date order
    record(&service, "2020-02-14", EATING_OUT, -6000, "valentine dinner").await?;
    record(&service, "2020-01-20", CLOTHES, -1500, "socks").await?;
    SampleLedger::populate(&service).await?;

    let items = service.get_budget_items(&ReportQuery::all()).await?;
    assert_eq!(items.len(), 9);
    assert!(items.windows(2).all(|w| w[0].date <= w[1].date));

    let mut previous: Cents = 0;
    for item in &items {
        assert_eq!(item.balance, previous + item.amount_cents);
        previous = item.balance;
    }

    Ok(())
}

#[tokio::test]
async fn test_budget_items_date_window_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let query = ReportQuery::between(Some(parse_date("2020-01-12")), Some(parse_date("2020-02-01")));
    let items = service.get_budget_items(&query).await?;

    let descriptions: Vec<&str> = items.iter().map(|i| i.short_description.as_str()).collect();
    assert_eq!(descriptions, vec!["pizza", "socks", "february rent"]);
    assert_eq!(items[0].balance, -2500);
    assert_eq!(items[2].balance, -104000);

    Ok(())
}

#[tokio::test]
async fn test_budget_items_by_month() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let months = service.get_budget_items_by_month(&ReportQuery::all()).await?;

    let keys: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(keys, vec!["2020/01", "2020/02", "2020/03"]);

    assert_eq!(months[0].total, -8500);
    let balances: Vec<Cents> = months[0].details.iter().map(|d| d.balance).collect();
    assert_eq!(balances, vec![4500, 7000, 8500]);

    assert_eq!(months[1].total, -109000);
    assert_eq!(months[2].total, 250000);
    assert_eq!(months[2].details[0].balance, -250000);

    for month in &months {
        let sum: Cents = month.details.iter().map(|d| d.amount_cents).sum();
        assert_eq!(month.total, sum);
    }

    // Every flat item lands in exactly one month
    let flat = service.get_budget_items(&ReportQuery::all()).await?;
    let mut flat_ids: Vec<ExpenseId> = flat.iter().map(|i| i.expense_id).collect();
    let mut grouped_ids: Vec<ExpenseId> = months
        .iter()
        .flat_map(|m| m.details.iter().map(|d| d.expense_id))
        .collect();
    flat_ids.sort();
    grouped_ids.sort();
    assert_eq!(flat_ids, grouped_ids);

    Ok(())
}

#[tokio::test]
async fn test_budget_items_by_category() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let groups = service
        .get_budget_items_by_category(&ReportQuery::all())
        .await?;

    let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(names, vec!["Clothes", "Eating Out", "Income", "Rent"]);

    let clothes = &groups[0];
    assert_eq!(clothes.total, -4500);
    let balances: Vec<Cents> = clothes.details.iter().map(|d| d.balance).collect();
    assert_eq!(balances, vec![1500, 4500]);

    assert_eq!(groups[1].total, -13000);
    assert_eq!(groups[2].total, 250000);
    assert_eq!(groups[3].total, -100000);

    Ok(())
}

#[tokio::test]
async fn test_lowercase_category_sorts_alphabetically() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let groceries = service.add_category("groceries", CategoryType::Expense).await?;

    record(&service, "2020-01-05", RENT, -100000, "january rent").await?;
    record(&service, "2020-01-06", groceries.id, -4000, "market").await?;
    record(&service, "2020-01-07", CLOTHES, -1500, "socks").await?;

    let query = ReportQuery::all();
    let groups = service.get_budget_items_by_category(&query).await?;
    let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(names, vec!["Clothes", "groceries", "Rent"]);

    let cross_tab = service.get_budget_cross_tab(&query).await?;
    let splits: Vec<&str> = cross_tab.months[0]
        .categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(splits, vec!["Clothes", "groceries", "Rent"]);

    Ok(())
}

#[tokio::test]
async fn test_budget_cross_tab() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let report = service.get_budget_cross_tab(&ReportQuery::all()).await?;

    assert_eq!(report.months.len(), 3);

    let january = &report.months[0];
    assert_eq!(january.month, "2020/01");
    assert_eq!(january.total, -8500);
    let names: Vec<&str> = january.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Clothes", "Eating Out"]);
    assert_eq!(january.category("Eating Out").unwrap().total, -7000);
    assert_eq!(january.category("Eating Out").unwrap().details.len(), 2);

    let february = &report.months[1];
    let names: Vec<&str> = february.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Clothes", "Eating Out", "Rent"]);

    for month in &report.months {
        let sum: Cents = month.categories.iter().map(|c| c.total).sum();
        assert_eq!(sum, month.total);
    }

    // Totals follow the store's category order and skip unused categories
    let totals: Vec<(&str, Cents)> = report
        .totals
        .iter()
        .map(|t| (t.category.as_str(), t.total))
        .collect();
    assert_eq!(
        totals,
        vec![
            ("Rent", -100000),
            ("Clothes", -4500),
            ("Eating Out", -13000),
            ("Income", 250000),
        ]
    );
    assert_eq!(report.grand_total("Utilities"), None);

    Ok(())
}

#[tokio::test]
async fn test_cross_tab_with_category_filter() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let report = service
        .get_budget_cross_tab(&ReportQuery::all().with_category(CLOTHES))
        .await?;

    assert_eq!(report.months.len(), 2);
    assert!(report.months.iter().all(|m| m.categories.len() == 1));
    assert_eq!(report.totals.len(), 1);
    assert_eq!(report.grand_total("Clothes"), Some(-4500));

    Ok(())
}

#[tokio::test]
async fn test_empty_reports() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let query = ReportQuery::all();
    assert!(service.get_budget_items(&query).await?.is_empty());
    assert!(service.get_budget_items_by_month(&query).await?.is_empty());
    assert!(service.get_budget_items_by_category(&query).await?.is_empty());

    let cross_tab = service.get_budget_cross_tab(&query).await?;
    assert!(cross_tab.months.is_empty());
    assert!(cross_tab.totals.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_reports_are_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let query = ReportQuery::between(None, Some(parse_date("2020-02-28")));
    for kind in [
        ReportKind::Items,
        ReportKind::ByMonth,
        ReportKind::ByCategory,
        ReportKind::CrossTab,
    ] {
        let first = service.get_report(kind, &query).await?;
        let second = service.get_report(kind, &query).await?;
        assert_eq!(first, second, "{} changed between calls", kind.as_str());
    }

    Ok(())
}

#[tokio::test]
async fn test_report_dispatch_matches_direct_call() -> Result<()> {
    let (service, _temp) = test_service().await?;
    SampleLedger::populate(&service).await?;

    let query = ReportQuery::all().with_category(INCOME);
    let report = service.get_report(ReportKind::Items, &query).await?;
    let direct = service.get_budget_items(&query).await?;

    assert_eq!(report, Report::Items(direct));
    Ok(())
}
