use crate::accessor::FieldOrigin;
use crate::integrity::IdentityWarning;
use crate::metrics::{MetricName, MetricSet};
use crate::resolver::ResolvedFields;
use crate::schema::Frequency;
use crate::scorecard::ScoreOutcome;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything a presentation layer needs. Consumers format these values;
/// they never re-derive the formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub frequency: Frequency,
    pub periods: Vec<String>,
    pub period_ends: Vec<NaiveDate>,
    pub metrics: MetricSet,
    pub fields: ResolvedFields,
    pub score: Option<ScoreOutcome>,
    pub warnings: Vec<IdentityWarning>,
}

/// Metrics shown in the Markdown summary, in display order.
const SUMMARY_METRICS: [MetricName; 8] = [
    MetricName::Growth,
    MetricName::Roe,
    MetricName::NetMargin,
    MetricName::AssetTurnover,
    MetricName::EquityMultiplier,
    MetricName::DebtRatio,
    MetricName::CurrentRatio,
    MetricName::InterestCoverage,
];

impl AnalysisReport {
    pub fn latest(&self, metric: MetricName) -> Option<f64> {
        self.metrics.latest(metric)
    }

    pub fn latest_period(&self) -> Option<&str> {
        self.periods.last().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One row per period, one column per metric.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str("period");
        for name in MetricName::ALL {
            output.push(',');
            output.push_str(name.as_str());
        }
        output.push('\n');

        for (idx, period) in self.periods.iter().enumerate() {
            output.push_str(period);
            for name in MetricName::ALL {
                let value = self
                    .metrics
                    .get(name)
                    .and_then(|s| s.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                output.push_str(&format!(",{}", value));
            }
            output.push('\n');
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Financial Ratios - {} ({:?})\n\n",
            self.ticker, self.frequency
        ));

        output.push_str("## Metrics\n\n");
        output.push_str("| Metric |");
        for period in &self.periods {
            output.push_str(&format!(" {} |", period));
        }
        output.push('\n');
        output.push_str("|---|");
        for _ in &self.periods {
            output.push_str("---:|");
        }
        output.push('\n');

        for name in SUMMARY_METRICS {
            output.push_str(&format!("| {} |", name));
            if let Some(series) = self.metrics.get(name) {
                for value in series {
                    output.push_str(&format!(" {:.4} |", value));
                }
            }
            output.push('\n');
        }
        output.push('\n');

        if let Some(score) = &self.score {
            output.push_str(&format!(
                "## Score: {:.0} / {:.0}\n\n",
                score.score, score.max_score
            ));
            for check in &score.checks {
                let marker = if check.passed { "x" } else { " " };
                let value = check
                    .value
                    .map(|v| format!("{:.4}", v))
                    .unwrap_or_else(|| "n/a".to_string());
                output.push_str(&format!("- [{}] {} ({})\n", marker, check.name, value));
            }
            output.push('\n');
        }

        output.push_str("## Field Sources\n\n");
        for (field, series) in self.fields.iter() {
            let source = match &series.origin {
                FieldOrigin::Reported { label } => format!("reported as '{}'", label),
                FieldOrigin::Matched { label, alias } => {
                    format!("matched '{}' via alias '{}'", label, alias)
                }
                FieldOrigin::Derived { formula } => format!("derived: {}", formula),
                FieldOrigin::Defaulted => "not found, zero-filled".to_string(),
                FieldOrigin::Degenerate => "empty statement".to_string(),
            };
            output.push_str(&format!("- {}: {}\n", field, source));
        }

        if !self.warnings.is_empty() {
            output.push_str("\n## Warnings\n\n");
            for warning in &self.warnings {
                output.push_str(&format!(
                    "- {}: assets {} vs liabilities {} + equity {} ({:.2}% off)\n",
                    warning.period,
                    warning.assets,
                    warning.liabilities,
                    warning.equity,
                    warning.relative_difference * 100.0
                ));
            }
        }

        output
    }
}
