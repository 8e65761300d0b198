use crate::aliases::FieldName;
use crate::resolver::ResolvedFields;
use crate::schema::EngineConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    #[schemars(description = "Period-over-period revenue growth (fraction)")]
    Growth,
    NetMargin,
    AssetTurnover,
    EquityMultiplier,
    #[schemars(description = "Net income over equity (fraction)")]
    Roe,
    Roa,
    GrossMargin,
    #[schemars(description = "Total liabilities over total assets (fraction)")]
    DebtRatio,
    CurrentRatio,
    InterestCoverage,
    #[schemars(description = "Cash conversion cycle in days")]
    C2cCycleDays,
    #[schemars(
        description = "Operating working capital: (current assets - cash) - (current liabilities - short-term debt)"
    )]
    Owc,
    #[schemars(description = "Plain current assets - current liabilities")]
    WorkingCapital,
    Nopat,
    InvestedCapital,
    Roic,
    #[schemars(description = "Operating cash flow over net income")]
    CashQuality,
    PayoutRatio,
}

impl MetricName {
    pub const ALL: [MetricName; 18] = [
        MetricName::Growth,
        MetricName::NetMargin,
        MetricName::AssetTurnover,
        MetricName::EquityMultiplier,
        MetricName::Roe,
        MetricName::Roa,
        MetricName::GrossMargin,
        MetricName::DebtRatio,
        MetricName::CurrentRatio,
        MetricName::InterestCoverage,
        MetricName::C2cCycleDays,
        MetricName::Owc,
        MetricName::WorkingCapital,
        MetricName::Nopat,
        MetricName::InvestedCapital,
        MetricName::Roic,
        MetricName::CashQuality,
        MetricName::PayoutRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Growth => "growth",
            MetricName::NetMargin => "net_margin",
            MetricName::AssetTurnover => "asset_turnover",
            MetricName::EquityMultiplier => "equity_multiplier",
            MetricName::Roe => "roe",
            MetricName::Roa => "roa",
            MetricName::GrossMargin => "gross_margin",
            MetricName::DebtRatio => "debt_ratio",
            MetricName::CurrentRatio => "current_ratio",
            MetricName::InterestCoverage => "interest_coverage",
            MetricName::C2cCycleDays => "c2c_cycle_days",
            MetricName::Owc => "owc",
            MetricName::WorkingCapital => "working_capital",
            MetricName::Nopat => "nopat",
            MetricName::InvestedCapital => "invested_capital",
            MetricName::Roic => "roic",
            MetricName::CashQuality => "cash_quality",
            MetricName::PayoutRatio => "payout_ratio",
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type MetricSeries = Vec<f64>;

/// Every computed metric, each one value per aligned period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet {
    series: BTreeMap<MetricName, MetricSeries>,
}

impl MetricSet {
    pub fn insert(&mut self, name: MetricName, series: MetricSeries) {
        self.series.insert(name, series);
    }

    pub fn get(&self, name: MetricName) -> Option<&[f64]> {
        self.series.get(&name).map(Vec::as_slice)
    }

    pub fn latest(&self, name: MetricName) -> Option<f64> {
        self.series.get(&name).and_then(|s| s.last().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricName, &MetricSeries)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Zero or near-zero denominators are replaced by `epsilon`; non-finite
/// results become 0.0. Division never fails and never yields inf/NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeDivision {
    epsilon: f64,
}

impl SafeDivision {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn div(&self, numerator: f64, denominator: f64) -> f64 {
        let denominator = if denominator.is_nan() || denominator.abs() < self.epsilon {
            self.epsilon
        } else {
            denominator
        };
        let ratio = numerator / denominator;
        if ratio.is_finite() {
            ratio
        } else {
            0.0
        }
    }
}

impl Default for SafeDivision {
    fn default() -> Self {
        Self::new(EngineConfig::default().epsilon)
    }
}

pub struct MetricsEngine {
    division: SafeDivision,
    assumed_tax_rate: f64,
    interest_floor: f64,
}

impl MetricsEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            division: SafeDivision::new(config.epsilon),
            assumed_tax_rate: config.assumed_tax_rate,
            interest_floor: config.interest_floor,
        }
    }

    pub fn compute(&self, fields: &ResolvedFields) -> MetricSet {
        let n = fields.period_count();
        let div = |a: f64, b: f64| self.division.div(a, b);

        let mut columns: BTreeMap<MetricName, MetricSeries> = MetricName::ALL
            .iter()
            .map(|name| (*name, Vec::with_capacity(n)))
            .collect();
        let mut push = |name: MetricName, value: f64| {
            if let Some(column) = columns.get_mut(&name) {
                column.push(if value.is_finite() { value } else { 0.0 });
            }
        };

        for t in 0..n {
            let at = |field: FieldName| fields.at(field, t);

            let revenue = at(FieldName::Revenue);
            let net_income = at(FieldName::NetIncome);
            let ebit = at(FieldName::Ebit);
            let assets = at(FieldName::TotalAssets);
            let equity = at(FieldName::Equity);
            let current_assets = at(FieldName::CurrentAssets);
            let current_liabilities = at(FieldName::CurrentLiabilities);

            let growth = if t == 0 {
                0.0
            } else {
                let previous = fields.at(FieldName::Revenue, t - 1);
                if previous == 0.0 {
                    0.0
                } else {
                    div(revenue, previous) - 1.0
                }
            };
            push(MetricName::Growth, growth);

            push(MetricName::NetMargin, div(net_income, revenue));
            push(MetricName::AssetTurnover, div(revenue, assets));
            push(MetricName::EquityMultiplier, div(assets, equity));
            push(MetricName::Roe, div(net_income, equity));
            push(MetricName::Roa, div(net_income, assets));
            push(MetricName::GrossMargin, div(at(FieldName::GrossProfit), revenue));

            push(MetricName::DebtRatio, div(at(FieldName::TotalLiabilities), assets));
            push(MetricName::CurrentRatio, div(current_assets, current_liabilities));

            let interest = at(FieldName::InterestExpense).max(self.interest_floor);
            push(MetricName::InterestCoverage, div(ebit, interest));

            let c2c = 365.0
                * (div(at(FieldName::Receivables), revenue) + div(at(FieldName::Inventory), revenue)
                    - div(at(FieldName::Payables), revenue));
            push(MetricName::C2cCycleDays, c2c);

            let owc = (current_assets - at(FieldName::Cash))
                - (current_liabilities - at(FieldName::ShortTermDebt));
            push(MetricName::Owc, owc);
            push(MetricName::WorkingCapital, current_assets - current_liabilities);

            let nopat = ebit * (1.0 - self.assumed_tax_rate);
            let invested_capital = equity + at(FieldName::TotalDebt);
            push(MetricName::Nopat, nopat);
            push(MetricName::InvestedCapital, invested_capital);
            push(MetricName::Roic, div(nopat, invested_capital));

            push(MetricName::CashQuality, div(at(FieldName::OperatingCashFlow), net_income));
            push(MetricName::PayoutRatio, div(at(FieldName::DividendsPaid), net_income));
        }

        let mut set = MetricSet::default();
        for (name, series) in columns {
            set.insert(name, series);
        }
        set
    }
}
