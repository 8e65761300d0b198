use crate::metrics::{MetricName, MetricSet};
use crate::schema::{Comparison, ScoreCardConfig, ScoreCriterion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub name: String,
    pub metric: MetricName,
    /// Latest-period value; `None` when the metric was not computed.
    pub value: Option<f64>,
    pub threshold: f64,
    pub weight: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub score: f64,
    pub max_score: f64,
    pub checks: Vec<CriterionCheck>,
}

impl ScoreOutcome {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }
}

/// Weighted pass/fail tally over the latest period. Stateless.
pub struct ScoreCard<'a> {
    config: &'a ScoreCardConfig,
}

impl<'a> ScoreCard<'a> {
    pub fn new(config: &'a ScoreCardConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, metrics: &MetricSet) -> ScoreOutcome {
        let checks: Vec<CriterionCheck> = self
            .config
            .criteria
            .iter()
            .map(|criterion| evaluate(criterion, metrics.latest(criterion.metric)))
            .collect();

        let raw: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();

        ScoreOutcome {
            score: raw.max(0.0).min(self.config.max_score),
            max_score: self.config.max_score,
            checks,
        }
    }
}

fn evaluate(criterion: &ScoreCriterion, value: Option<f64>) -> CriterionCheck {
    let passed = value.is_some_and(|v| match criterion.comparison {
        Comparison::Above => v > criterion.threshold,
        Comparison::Below => v < criterion.threshold,
    });

    CriterionCheck {
        name: criterion.name.clone(),
        metric: criterion.metric,
        value,
        threshold: criterion.threshold,
        weight: criterion.weight,
        passed,
    }
}
