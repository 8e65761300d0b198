//! # Financial Ratio Engine
//!
//! A library for turning raw vendor financial statements (income statement,
//! balance sheet, cash-flow statement) into a clean, period-aligned set of
//! derived ratios without crashing on missing or zero data.
//!
//! ## Core Concepts
//!
//! - **Alias Groups**: Ordered label synonyms for one line item; first match wins
//! - **Fallback Formulas**: Missing totals are rebuilt from sub-items (e.g. liabilities = assets - equity)
//! - **Period Alignment**: All three statements share one strictly increasing period axis
//! - **Safe Division**: Zero denominators never raise and never produce inf/NaN
//! - **Provenance**: Every resolved field records whether it was reported, matched, derived or defaulted
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_ratio_engine::*;
//! use chrono::NaiveDate;
//!
//! let periods = vec![
//!     NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
//! ];
//! let income = StatementTable::new(periods.clone())
//!     .with_row("Total Revenue", &[100.0, 120.0])?
//!     .with_row("Net Income", &[10.0, 15.0])?;
//! let balance = StatementTable::new(periods)
//!     .with_row("Stockholders Equity", &[50.0, 60.0])?;
//!
//! let request = AnalysisRequest::new("ACME", Frequency::Annual);
//! let report = RatioAnalyzer::default().analyze_tables(
//!     &request,
//!     &income,
//!     &balance,
//!     &StatementTable::empty(),
//! )?;
//!
//! assert_eq!(report.latest(MetricName::Roe), Some(0.25));
//! ```

pub mod accessor;
pub mod adjustments;
pub mod aliases;
pub mod aligner;
pub mod error;
pub mod ingestion;
pub mod integrity;
pub mod metrics;
pub mod provider;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod scorecard;
pub mod table;
pub mod utils;

pub use accessor::{resolve, FieldOrigin, FieldSeries, StatementAccessor, DEGENERATE_PERIODS};
pub use adjustments::{apply_adjustments, LabelAdjustment, StatementAdjustments};
pub use aliases::{AliasCatalog, AliasGroup, FieldName};
pub use aligner::{align, AlignOptions, AlignedStatements, PeriodAligner};
pub use error::{RatioEngineError, Result};
pub use ingestion::{table_from_records, RawCell, StatementRecord};
pub use integrity::{check_balance_identity, verify_balance_identity, IdentityWarning};
pub use metrics::{MetricName, MetricSeries, MetricSet, MetricsEngine, SafeDivision};
pub use provider::{InMemoryProvider, StatementProvider};
pub use report::AnalysisReport;
pub use resolver::{DerivedFieldResolver, Fallback, ResolvedFields};
pub use schema::*;
pub use scorecard::{CriterionCheck, ScoreCard, ScoreOutcome};
pub use table::{StatementRow, StatementTable};

use log::{debug, info};

/// Runs the whole pipeline for one request. Holds configuration only; every
/// call is independent of every other.
#[derive(Debug, Clone, Default)]
pub struct RatioAnalyzer {
    config: EngineConfig,
}

impl RatioAnalyzer {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches the three statements from `provider` and analyzes them.
    pub fn analyze<P>(&self, provider: &P, request: &AnalysisRequest) -> Result<AnalysisReport>
    where
        P: StatementProvider + ?Sized,
    {
        info!(
            "Fetching {:?} statements for {}",
            request.frequency, request.ticker
        );

        let income = provider.fetch_statement(&request.ticker, StatementKind::Income, request.frequency)?;
        let balance =
            provider.fetch_statement(&request.ticker, StatementKind::Balance, request.frequency)?;
        let cashflow =
            provider.fetch_statement(&request.ticker, StatementKind::CashFlow, request.frequency)?;

        self.analyze_tables(request, &income, &balance, &cashflow)
    }

    /// Analyzes already materialized tables.
    pub fn analyze_tables(
        &self,
        request: &AnalysisRequest,
        raw_income: &StatementTable,
        raw_balance: &StatementTable,
        raw_cashflow: &StatementTable,
    ) -> Result<AnalysisReport> {
        info!("Analyzing {} ({:?})", request.ticker, request.frequency);

        if !request.adjustments.is_empty() {
            debug!(
                "Applying {} income, {} balance and {} cash-flow adjustments",
                request.adjustments.income.len(),
                request.adjustments.balance.len(),
                request.adjustments.cashflow.len()
            );
        }
        let income = request.adjustments.apply(StatementKind::Income, raw_income)?;
        let balance = request.adjustments.apply(StatementKind::Balance, raw_balance)?;
        let cashflow = request.adjustments.apply(StatementKind::CashFlow, raw_cashflow)?;

        let options = AlignOptions {
            window: request.effective_window(&self.config),
            filter: request.period_filter,
            label_format: request.label_format,
        };
        let aligned = PeriodAligner::new(options).align(&income, &balance, &cashflow)?;

        let resolver = DerivedFieldResolver::new(self.config.missing_policy);
        let fields = resolver.resolve_all(&aligned, &self.config.aliases);

        for (field, series) in fields.iter() {
            debug!("{} <- {:?}", field, series.origin);
        }

        let metrics = MetricsEngine::new(&self.config).compute(&fields);

        let warnings =
            check_balance_identity(&fields, &aligned.labels, self.config.identity_tolerance);

        let score = request
            .include_score
            .then(|| ScoreCard::new(&self.config.scorecard).score(&metrics));

        info!(
            "Computed {} metrics over {} periods for {}",
            metrics.len(),
            aligned.period_count(),
            request.ticker
        );

        Ok(AnalysisReport {
            ticker: request.ticker.clone(),
            frequency: request.frequency,
            periods: aligned.labels,
            period_ends: aligned.period_ends,
            metrics,
            fields,
            score,
            warnings,
        })
    }
}

/// Analyzes tables with the default [`EngineConfig`].
pub fn analyze_statements(
    request: &AnalysisRequest,
    income: &StatementTable,
    balance: &StatementTable,
    cashflow: &StatementTable,
) -> Result<AnalysisReport> {
    RatioAnalyzer::default().analyze_tables(request, income, balance, cashflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn periods() -> Vec<NaiveDate> {
        vec![
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        ]
    }

    #[test]
    fn test_end_to_end_processing() {
        let income = StatementTable::new(periods())
            .with_row("Total Revenue", &[100.0, 120.0])
            .unwrap()
            .with_row("Net Income", &[10.0, 15.0])
            .unwrap();
        let balance = StatementTable::new(periods())
            .with_row("Stockholders Equity", &[50.0, 60.0])
            .unwrap();

        let request = AnalysisRequest::new("ACME", Frequency::Annual);
        let report =
            analyze_statements(&request, &income, &balance, &StatementTable::empty()).unwrap();

        assert_eq!(report.periods, vec!["2022-12".to_string(), "2023-12".to_string()]);
        assert_eq!(report.latest(MetricName::Roe), Some(0.25));
        assert!(report.score.is_some());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_adjustments_run_before_resolution() {
        let income = StatementTable::new(periods())
            .with_row("Revenues", &[100.0, 150.0])
            .unwrap();

        let mut adjustments = StatementAdjustments::default();
        adjustments.push(
            StatementKind::Income,
            LabelAdjustment::Rename {
                target: "Revenues".to_string(),
                new_label: "Total Revenue".to_string(),
            },
        );
        let request = AnalysisRequest::new("ACME", Frequency::Annual).with_adjustments(adjustments);

        let report = analyze_statements(
            &request,
            &income,
            &StatementTable::empty(),
            &StatementTable::empty(),
        )
        .unwrap();

        assert_eq!(report.fields.values(FieldName::Revenue), &[100.0, 150.0]);
        assert_eq!(report.latest(MetricName::Growth), Some(0.5));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            interest_floor: -1.0,
            ..EngineConfig::default()
        };
        assert!(RatioAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_score_can_be_skipped() {
        let income = StatementTable::new(periods())
            .with_row("Total Revenue", &[100.0, 120.0])
            .unwrap();
        let request = AnalysisRequest::new("ACME", Frequency::Annual).without_score();
        let report = analyze_statements(
            &request,
            &income,
            &StatementTable::empty(),
            &StatementTable::empty(),
        )
        .unwrap();
        assert!(report.score.is_none());
    }
}
