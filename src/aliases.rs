//! Label knowledge for every semantic field the engine resolves.
//!
//! Vendors and equity markets disagree on row labels ("Total Revenue" vs
//! "Operating Revenue", "Stockholders Equity" vs "Total Equity", ...). All of
//! that lives here, as ordered [`AliasGroup`]s: the first alias that resolves
//! wins, so the most specific label must come first. Substring matching is
//! only attempted after every alias failed an exact match (see
//! [`crate::accessor`]), which is why broad labels like "Revenue" are safe at
//! the end of a group.

use crate::error::{RatioEngineError, Result};
use crate::schema::StatementKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Revenue,
    NetIncome,
    Ebit,
    GrossProfit,
    PretaxIncome,
    InterestExpense,
    TotalAssets,
    Equity,
    TotalLiabilities,
    CurrentAssets,
    CurrentLiabilities,
    Cash,
    ShortTermDebt,
    LongTermDebt,
    TotalDebt,
    Receivables,
    Inventory,
    Payables,
    OperatingCashFlow,
    DividendsPaid,
}

impl FieldName {
    pub const ALL: [FieldName; 20] = [
        FieldName::Revenue,
        FieldName::NetIncome,
        FieldName::Ebit,
        FieldName::GrossProfit,
        FieldName::PretaxIncome,
        FieldName::InterestExpense,
        FieldName::TotalAssets,
        FieldName::Equity,
        FieldName::TotalLiabilities,
        FieldName::CurrentAssets,
        FieldName::CurrentLiabilities,
        FieldName::Cash,
        FieldName::ShortTermDebt,
        FieldName::LongTermDebt,
        FieldName::TotalDebt,
        FieldName::Receivables,
        FieldName::Inventory,
        FieldName::Payables,
        FieldName::OperatingCashFlow,
        FieldName::DividendsPaid,
    ];

    pub fn statement(&self) -> StatementKind {
        match self {
            FieldName::Revenue
            | FieldName::NetIncome
            | FieldName::Ebit
            | FieldName::GrossProfit
            | FieldName::PretaxIncome
            | FieldName::InterestExpense => StatementKind::Income,

            FieldName::OperatingCashFlow | FieldName::DividendsPaid => StatementKind::CashFlow,

            _ => StatementKind::Balance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Revenue => "revenue",
            FieldName::NetIncome => "net_income",
            FieldName::Ebit => "ebit",
            FieldName::GrossProfit => "gross_profit",
            FieldName::PretaxIncome => "pretax_income",
            FieldName::InterestExpense => "interest_expense",
            FieldName::TotalAssets => "total_assets",
            FieldName::Equity => "equity",
            FieldName::TotalLiabilities => "total_liabilities",
            FieldName::CurrentAssets => "current_assets",
            FieldName::CurrentLiabilities => "current_liabilities",
            FieldName::Cash => "cash",
            FieldName::ShortTermDebt => "short_term_debt",
            FieldName::LongTermDebt => "long_term_debt",
            FieldName::TotalDebt => "total_debt",
            FieldName::Receivables => "receivables",
            FieldName::Inventory => "inventory",
            FieldName::Payables => "payables",
            FieldName::OperatingCashFlow => "operating_cash_flow",
            FieldName::DividendsPaid => "dividends_paid",
        }
    }

    /// Built-in label synonyms, most specific first.
    pub fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            FieldName::Revenue => &[
                "Total Revenue",
                "Revenue",
                "Operating Revenue",
                "Total Operating Revenue",
            ],
            FieldName::NetIncome => &[
                "Net Income",
                "Net Income Common Stockholders",
                "Net Income From Continuing Operation Net Minority Interest",
                "Net Income Including Noncontrolling Interests",
            ],
            FieldName::Ebit => &["EBIT", "Operating Income", "Total Operating Income As Reported"],
            FieldName::GrossProfit => &["Gross Profit"],
            FieldName::PretaxIncome => &["Pretax Income", "Income Before Tax", "Total Profit"],
            FieldName::InterestExpense => &[
                "Interest Expense",
                "Financial Expense",
                "Interest Expense Non Operating",
                "Finance Costs",
            ],
            FieldName::TotalAssets => &["Total Assets"],
            FieldName::Equity => &[
                "Stockholders Equity",
                "Total Equity",
                "Common Stock Equity",
                "Total Equity Gross Minority Interest",
                "Total Shareholder Equity",
            ],
            FieldName::TotalLiabilities => &[
                "Total Liabilities",
                "Total Liabilities Net Minority Interest",
            ],
            FieldName::CurrentAssets => &["Total Current Assets", "Current Assets"],
            FieldName::CurrentLiabilities => &["Total Current Liabilities", "Current Liabilities"],
            FieldName::Cash => &[
                "Cash And Cash Equivalents",
                "Cash Cash Equivalents And Short Term Investments",
                "Cash Financial",
            ],
            FieldName::ShortTermDebt => &[
                "Short Term Debt",
                "Current Debt",
                "Current Debt And Capital Lease Obligation",
                "Short Term Borrowings",
            ],
            FieldName::LongTermDebt => &[
                "Long Term Debt",
                "Long Term Debt And Capital Lease Obligation",
            ],
            FieldName::TotalDebt => &["Total Debt"],
            FieldName::Receivables => &["Net Receivables", "Accounts Receivable", "Receivables"],
            FieldName::Inventory => &["Inventory", "Inventories"],
            FieldName::Payables => &[
                "Accounts Payable",
                "Payables",
                "Payables And Accrued Expenses",
            ],
            FieldName::OperatingCashFlow => &[
                "Operating Cash Flow",
                "Cash Flow From Continuing Operating Activities",
                "Total Cash From Operating Activities",
            ],
            FieldName::DividendsPaid => &[
                "Cash Dividends Paid",
                "Common Stock Dividend Paid",
                "Dividends Paid",
            ],
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, non-empty set of labels treated as the same line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    labels: Vec<String>,
}

impl AliasGroup {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(RatioEngineError::InvalidRequest(
                "An alias group needs at least one label".to_string(),
            ));
        }
        Ok(Self { labels })
    }

    pub(crate) fn from_static(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Built-in aliases plus any extra labels configured for a specific vendor.
/// Extra labels are tried after the built-ins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AliasCatalog {
    #[serde(default)]
    pub extra: BTreeMap<FieldName, Vec<String>>,
}

impl AliasCatalog {
    pub fn with_extra(mut self, field: FieldName, label: impl Into<String>) -> Self {
        self.extra.entry(field).or_default().push(label.into());
        self
    }

    pub fn group(&self, field: FieldName) -> AliasGroup {
        let mut group = AliasGroup::from_static(field.default_aliases());
        if let Some(extra) = self.extra.get(&field) {
            group.labels.extend(extra.iter().cloned());
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_aliases() {
        for field in FieldName::ALL {
            assert!(!field.default_aliases().is_empty(), "{} has no aliases", field);
        }
    }

    #[test]
    fn test_statement_assignment() {
        assert_eq!(FieldName::Revenue.statement(), StatementKind::Income);
        assert_eq!(FieldName::InterestExpense.statement(), StatementKind::Income);
        assert_eq!(FieldName::Inventory.statement(), StatementKind::Balance);
        assert_eq!(FieldName::DividendsPaid.statement(), StatementKind::CashFlow);
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(AliasGroup::new(Vec::<String>::new()).is_err());
        let group = AliasGroup::new(["Revenue"]).unwrap();
        assert_eq!(group.labels(), &["Revenue".to_string()]);
    }

    #[test]
    fn test_catalog_appends_extra_labels() {
        let catalog = AliasCatalog::default().with_extra(FieldName::Revenue, "Net Sales");
        let group = catalog.group(FieldName::Revenue);
        assert_eq!(group.labels().first().map(String::as_str), Some("Total Revenue"));
        assert_eq!(group.labels().last().map(String::as_str), Some("Net Sales"));

        let catalog_json = serde_json::to_string(&catalog).unwrap();
        assert!(catalog_json.contains("revenue"));
    }
}
