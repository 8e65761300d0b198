use crate::adjustments::StatementAdjustments;
use crate::aliases::AliasCatalog;
use crate::error::{RatioEngineError, Result};
use crate::metrics::MetricName;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StatementKind {
    #[schemars(description = "Income statement (revenue, profit, EBIT, interest)")]
    Income,

    #[schemars(description = "Balance sheet (assets, liabilities, equity and their current sub-items)")]
    Balance,

    #[schemars(description = "Cash-flow statement (operating cash flow, dividends paid)")]
    CashFlow,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Frequency {
    #[schemars(description = "Fiscal-year statements")]
    Annual,

    #[schemars(description = "Fiscal-quarter statements")]
    Quarterly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    #[schemars(description = "Keep only the last N labelled periods after sorting, filtering and label de-duplication")]
    Trailing(usize),

    #[schemars(description = "Keep the whole available history (long-horizon by-quarter views)")]
    Full,
}

impl Default for Window {
    fn default() -> Self {
        Self::Trailing(DEFAULT_WINDOW)
    }
}

pub const DEFAULT_WINDOW: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum PeriodLabelFormat {
    #[default]
    #[schemars(description = "Labels like 2023-12")]
    YearMonth,

    #[schemars(description = "Labels like 2023")]
    Year,
}

impl PeriodLabelFormat {
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Self::YearMonth => date.format("%Y-%m").to_string(),
            Self::Year => date.format("%Y").to_string(),
        }
    }
}

/// Keeps only periods whose end date has a given month-day suffix,
/// e.g. `03-31` for "Q1 of every year".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PeriodFilter {
    pub month: u32,
    pub day: u32,
}

impl PeriodFilter {
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(RatioEngineError::InvalidRequest(format!(
                "Period filter {:02}-{:02} is not a valid month-day",
                month, day
            )));
        }
        Ok(Self { month, day })
    }

    /// Parses a `MM-DD` suffix.
    pub fn parse(suffix: &str) -> Result<Self> {
        let invalid = || {
            RatioEngineError::InvalidRequest(format!(
                "Invalid period filter '{}'. Expected MM-DD",
                suffix
            ))
        };

        let (month, day) = suffix.trim().split_once('-').ok_or_else(invalid)?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        let day = day.parse::<u32>().map_err(|_| invalid())?;
        Self::new(month, day)
    }

    /// Calendar quarter end: 1 -> 03-31, 2 -> 06-30, 3 -> 09-30, 4 -> 12-31.
    pub fn calendar_quarter(quarter: u32) -> Result<Self> {
        match quarter {
            1 => Self::new(3, 31),
            2 => Self::new(6, 30),
            3 => Self::new(9, 30),
            4 => Self::new(12, 31),
            other => Err(RatioEngineError::InvalidRequest(format!(
                "Quarter must be between 1 and 4, got {}",
                other
            ))),
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum MissingPolicy {
    #[default]
    #[schemars(description = "Missing cells in a matched row become 0.0")]
    ZeroFill,

    #[schemars(
        description = "Missing cells take the previous period's value; leading gaps become 0.0"
    )]
    CarryForward,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Comparison {
    Above,
    Below,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ScoreCriterion {
    #[schemars(description = "Human readable name of the check, e.g. 'ROE above 15%'")]
    pub name: String,

    pub metric: MetricName,

    pub comparison: Comparison,

    #[schemars(description = "Threshold in the metric's own unit (fractions for ratios, days for c2c)")]
    pub threshold: f64,

    #[schemars(description = "Points awarded when the check passes. Must be non-negative.")]
    pub weight: f64,
}

impl ScoreCriterion {
    pub fn new(
        name: impl Into<String>,
        metric: MetricName,
        comparison: Comparison,
        threshold: f64,
        weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            metric,
            comparison,
            threshold,
            weight,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ScoreCardConfig {
    pub max_score: f64,
    pub criteria: Vec<ScoreCriterion>,
}

impl Default for ScoreCardConfig {
    fn default() -> Self {
        Self {
            max_score: 100.0,
            criteria: vec![
                ScoreCriterion::new("ROE above 15%", MetricName::Roe, Comparison::Above, 0.15, 20.0),
                ScoreCriterion::new(
                    "Operating cash flow covers net income",
                    MetricName::CashQuality,
                    Comparison::Above,
                    1.0,
                    20.0,
                ),
                ScoreCriterion::new(
                    "Debt ratio below 50%",
                    MetricName::DebtRatio,
                    Comparison::Below,
                    0.5,
                    20.0,
                ),
                ScoreCriterion::new(
                    "Revenue growth above 10%",
                    MetricName::Growth,
                    Comparison::Above,
                    0.1,
                    20.0,
                ),
                ScoreCriterion::new(
                    "Cash conversion cycle under 60 days",
                    MetricName::C2cCycleDays,
                    Comparison::Below,
                    60.0,
                    20.0,
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Tax rate used to derive NOPAT from EBIT. Range: 0.0 to <1.0.")]
    pub assumed_tax_rate: f64,

    #[schemars(
        description = "Denominators with an absolute value below this are replaced by it before dividing. Must be > 0."
    )]
    pub epsilon: f64,

    #[schemars(description = "Minimum interest expense used for interest coverage. Must be > 0.")]
    pub interest_floor: f64,

    #[schemars(description = "Trailing window used when a request does not specify one")]
    pub default_window: usize,

    pub missing_policy: MissingPolicy,

    #[schemars(
        description = "Relative tolerance for the assets = liabilities + equity diagnostic (0.01 = 1%)"
    )]
    pub identity_tolerance: f64,

    pub scorecard: ScoreCardConfig,

    #[schemars(description = "Vendor-specific labels tried after the built-in aliases of each field")]
    pub aliases: AliasCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assumed_tax_rate: 0.25,
            epsilon: 1e-9,
            interest_floor: 1e-6,
            default_window: DEFAULT_WINDOW,
            missing_policy: MissingPolicy::ZeroFill,
            identity_tolerance: 0.01,
            scorecard: ScoreCardConfig::default(),
            aliases: AliasCatalog::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.assumed_tax_rate) {
            return Err(RatioEngineError::InvalidConfig(format!(
                "assumed_tax_rate {} must be in [0.0, 1.0)",
                self.assumed_tax_rate
            )));
        }

        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(RatioEngineError::InvalidConfig(format!(
                "epsilon {} must be a positive finite number",
                self.epsilon
            )));
        }

        if !(self.interest_floor.is_finite() && self.interest_floor > 0.0) {
            return Err(RatioEngineError::InvalidConfig(format!(
                "interest_floor {} must be a positive finite number",
                self.interest_floor
            )));
        }

        if self.default_window == 0 {
            return Err(RatioEngineError::InvalidConfig(
                "default_window must be at least 1".to_string(),
            ));
        }

        if !(self.identity_tolerance.is_finite() && self.identity_tolerance >= 0.0) {
            return Err(RatioEngineError::InvalidConfig(format!(
                "identity_tolerance {} must be non-negative",
                self.identity_tolerance
            )));
        }

        if !(self.scorecard.max_score.is_finite() && self.scorecard.max_score >= 0.0) {
            return Err(RatioEngineError::InvalidConfig(format!(
                "scorecard max_score {} must be non-negative",
                self.scorecard.max_score
            )));
        }

        for criterion in &self.scorecard.criteria {
            if !(criterion.weight.is_finite() && criterion.weight >= 0.0) {
                return Err(RatioEngineError::InvalidConfig(format!(
                    "Score criterion '{}' has invalid weight {}",
                    criterion.name, criterion.weight
                )));
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// One analysis request. Replaces any notion of ambient UI/session state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnalysisRequest {
    #[schemars(description = "Ticker symbol as understood by the data provider, e.g. 'NVDA' or '600519.SS'")]
    pub ticker: String,

    pub frequency: Frequency,

    #[serde(default)]
    #[schemars(description = "Trailing window. Falls back to the engine's default_window when absent.")]
    pub window: Option<Window>,

    #[serde(default)]
    pub period_filter: Option<PeriodFilter>,

    #[serde(default)]
    pub label_format: PeriodLabelFormat,

    #[serde(default)]
    pub adjustments: StatementAdjustments,

    #[serde(default = "default_true")]
    #[schemars(description = "Whether to evaluate the ScoreCard on the latest period")]
    pub include_score: bool,
}

fn default_true() -> bool {
    true
}

impl AnalysisRequest {
    pub fn new(ticker: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            ticker: ticker.into(),
            frequency,
            window: None,
            period_filter: None,
            label_format: PeriodLabelFormat::default(),
            adjustments: StatementAdjustments::default(),
            include_score: true,
        }
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_period_filter(mut self, filter: PeriodFilter) -> Self {
        self.period_filter = Some(filter);
        self
    }

    pub fn with_label_format(mut self, format: PeriodLabelFormat) -> Self {
        self.label_format = format;
        self
    }

    pub fn with_adjustments(mut self, adjustments: StatementAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn without_score(mut self) -> Self {
        self.include_score = false;
        self
    }

    pub fn effective_window(&self, config: &EngineConfig) -> Window {
        self.window
            .unwrap_or(Window::Trailing(config.default_window))
    }
}
