use financial_ratio_engine::{
    table_from_records, AnalysisRequest, FieldName, Frequency, InMemoryProvider, LabelAdjustment,
    MetricName, RatioAnalyzer, RawCell, StatementAdjustments, StatementKind, StatementRecord,
};

fn record(label: &str, period: &str, value: f64) -> StatementRecord {
    StatementRecord::new(label, period, RawCell::Number(value))
}

fn main() {
    let income_records = vec![
        record("Revenues", "2022-12-31", 48_200.0),
        record("Revenues", "2023-12-31", 55_900.0),
        record("Operating Income", "2022-12-31", 7_300.0),
        record("Operating Income", "2023-12-31", 9_100.0),
        record("Pretax Income", "2022-12-31", 6_900.0),
        record("Pretax Income", "2023-12-31", 8_650.0),
        record("Net Income", "2022-12-31", 5_200.0),
        record("Net Income", "2023-12-31", 6_480.0),
    ];

    let balance_records = vec![
        record("Total Assets", "2022-12-31", 61_000.0),
        record("Total Assets", "2023-12-31", 66_400.0),
        record("Stockholders Equity", "2022-12-31", 27_500.0),
        record("Stockholders Equity", "2023-12-31", 31_200.0),
        record("Total Current Assets", "2022-12-31", 22_000.0),
        record("Total Current Assets", "2023-12-31", 24_800.0),
        record("Total Current Liabilities", "2022-12-31", 14_100.0),
        record("Total Current Liabilities", "2023-12-31", 15_300.0),
        record("Cash And Cash Equivalents", "2022-12-31", 6_400.0),
        record("Cash And Cash Equivalents", "2023-12-31", 7_900.0),
        record("Accounts Receivable", "2022-12-31", 5_900.0),
        record("Accounts Receivable", "2023-12-31", 6_300.0),
        record("Inventory", "2022-12-31", 7_800.0),
        record("Inventory", "2023-12-31", 8_100.0),
        record("Accounts Payable", "2022-12-31", 6_200.0),
        record("Accounts Payable", "2023-12-31", 6_700.0),
        record("Total Debt", "2022-12-31", 18_000.0),
        record("Total Debt", "2023-12-31", 17_400.0),
        record("Long Term Debt", "2022-12-31", 15_500.0),
        record("Long Term Debt", "2023-12-31", 15_000.0),
    ];

    let cashflow_records = vec![
        record("Operating Cash Flow", "2022-12-31", 6_100.0),
        record("Operating Cash Flow", "2023-12-31", 7_750.0),
        StatementRecord::new(
            "Cash Dividends Paid",
            "2022-12-31",
            RawCell::Text("(1,560)".to_string()),
        ),
        StatementRecord::new(
            "Cash Dividends Paid",
            "2023-12-31",
            RawCell::Text("(1,940)".to_string()),
        ),
    ];

    let provider = InMemoryProvider::new()
        .with_table(
            "DEMO",
            StatementKind::Income,
            Frequency::Annual,
            table_from_records(&income_records).expect("income records should parse"),
        )
        .with_table(
            "DEMO",
            StatementKind::Balance,
            Frequency::Annual,
            table_from_records(&balance_records).expect("balance records should parse"),
        )
        .with_table(
            "DEMO",
            StatementKind::CashFlow,
            Frequency::Annual,
            table_from_records(&cashflow_records).expect("cash-flow records should parse"),
        );

    // This vendor says "Revenues" where the built-in aliases expect "Total Revenue".
    let mut adjustments = StatementAdjustments::default();
    adjustments.push(
        StatementKind::Income,
        LabelAdjustment::Rename {
            target: "Revenues".to_string(),
            new_label: "Total Revenue".to_string(),
        },
    );

    let request = AnalysisRequest::new("DEMO", Frequency::Annual).with_adjustments(adjustments);
    let report = RatioAnalyzer::default()
        .analyze(&provider, &request)
        .expect("analysis should succeed");

    println!("{}", report.to_markdown());

    println!("Derived fields:");
    for field in [
        FieldName::TotalLiabilities,
        FieldName::ShortTermDebt,
        FieldName::InterestExpense,
    ] {
        println!(
            " - {}: {:?} ({:?})",
            field,
            report.fields.values(field),
            report.fields.origin(field)
        );
    }

    if let Some(roe) = report.latest(MetricName::Roe) {
        println!("Latest ROE: {:.2}%", roe * 100.0);
    }

    println!("\nCSV:\n{}", report.to_csv());
}
