use crate::aliases::AliasGroup;
use crate::schema::MissingPolicy;
use crate::table::{StatementRow, StatementTable};
use log::debug;
use serde::{Deserialize, Serialize};

/// Length of the all-zero series returned for a table without columns, so
/// downstream arithmetic stays shape-compatible with the default window.
pub const DEGENERATE_PERIODS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldOrigin {
    /// Exact label match after trimming whitespace
    Reported { label: String },
    /// Case and space-insensitive substring match of `alias` inside `label`
    Matched { label: String, alias: String },
    /// Reconstructed from sibling fields because no usable row was found
    Derived { formula: String },
    /// Nothing matched; zero-filled to keep the metric computable
    Defaulted,
    /// The table had no columns at all
    Degenerate,
}

impl FieldOrigin {
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Reported { .. } | Self::Matched { .. })
    }
}

/// A resolved line item: one defined value per period plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSeries {
    pub values: Vec<f64>,
    pub origin: FieldOrigin,
}

impl FieldSeries {
    pub fn zeros(len: usize, origin: FieldOrigin) -> Self {
        Self {
            values: vec![0.0; len],
            origin,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Value at `idx`, or 0.0 past the end.
    pub fn at(&self, idx: usize) -> f64 {
        self.values.get(idx).copied().unwrap_or(0.0)
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn abs(mut self) -> Self {
        for v in &mut self.values {
            *v = v.abs();
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchTier {
    Exact,
    Substring,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementAccessor {
    policy: MissingPolicy,
}

impl StatementAccessor {
    pub fn new(policy: MissingPolicy) -> Self {
        Self { policy }
    }

    pub fn resolve(&self, table: &StatementTable, aliases: &AliasGroup) -> FieldSeries {
        if table.is_empty() {
            return FieldSeries::zeros(DEGENERATE_PERIODS, FieldOrigin::Degenerate);
        }

        for tier in [MatchTier::Exact, MatchTier::Substring] {
            for alias in aliases.iter() {
                if let Some(row) = find_row(table, alias, tier) {
                    debug!(
                        "Resolved alias '{}' to row '{}' ({:?} match)",
                        alias, row.label, tier
                    );
                    let origin = match tier {
                        MatchTier::Exact => FieldOrigin::Reported {
                            label: row.label.trim().to_string(),
                        },
                        MatchTier::Substring => FieldOrigin::Matched {
                            label: row.label.trim().to_string(),
                            alias: alias.to_string(),
                        },
                    };
                    return FieldSeries {
                        values: self.fill(&row.values),
                        origin,
                    };
                }
            }
        }

        debug!("No row matched aliases {:?}; zero-filling", aliases.labels());
        FieldSeries::zeros(table.period_count(), FieldOrigin::Defaulted)
    }

    fn fill(&self, values: &[Option<f64>]) -> Vec<f64> {
        match self.policy {
            MissingPolicy::ZeroFill => values.iter().map(|v| v.unwrap_or(0.0)).collect(),
            MissingPolicy::CarryForward => {
                let mut last = 0.0;
                values
                    .iter()
                    .map(|v| {
                        if let Some(x) = v {
                            last = *x;
                        }
                        last
                    })
                    .collect()
            }
        }
    }
}

/// Resolves with the default [`MissingPolicy::ZeroFill`].
pub fn resolve(table: &StatementTable, aliases: &AliasGroup) -> FieldSeries {
    StatementAccessor::default().resolve(table, aliases)
}

fn find_row<'t>(table: &'t StatementTable, alias: &str, tier: MatchTier) -> Option<&'t StatementRow> {
    let wanted = match tier {
        MatchTier::Exact => alias.trim().to_string(),
        MatchTier::Substring => normalize(alias),
    };

    if wanted.is_empty() {
        return None;
    }

    table.rows().iter().find(|row| {
        let hit = match tier {
            MatchTier::Exact => row.label.trim() == wanted,
            MatchTier::Substring => normalize(&row.label).contains(&wanted),
        };
        hit && row.has_value()
    })
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn two_periods() -> StatementTable {
        StatementTable::new(vec![
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        ])
    }

    #[test]
    fn test_earlier_alias_wins() {
        let table = two_periods()
            .with_row("Revenue", &[1.0, 2.0])
            .unwrap()
            .with_row("Total Revenue", &[100.0, 120.0])
            .unwrap();
        let group = AliasGroup::new(["Total Revenue", "Revenue"]).unwrap();

        let series = resolve(&table, &group);
        assert_eq!(series.values, vec![100.0, 120.0]);
        assert_eq!(
            series.origin,
            FieldOrigin::Reported {
                label: "Total Revenue".to_string()
            }
        );
    }

    #[test]
    fn test_exact_tier_beats_substring_tier() {
        let table = two_periods()
            .with_row("Total Operating Revenue", &[5.0, 6.0])
            .unwrap()
            .with_row("Revenue", &[7.0, 8.0])
            .unwrap();
        let group = AliasGroup::new(["Operating Revenue", "Revenue"]).unwrap();

        let series = resolve(&table, &group);
        assert_eq!(series.values, vec![7.0, 8.0]);
    }

    #[test]
    fn test_substring_match_is_case_and_space_insensitive() {
        let table = two_periods()
            .with_row("  total   REVENUE (net) ", &[3.0, 4.0])
            .unwrap();
        let group = AliasGroup::new(["Total Revenue"]).unwrap();

        let series = resolve(&table, &group);
        assert_eq!(series.values, vec![3.0, 4.0]);
        assert!(matches!(series.origin, FieldOrigin::Matched { .. }));
    }

    #[test]
    fn test_all_missing_row_is_skipped() {
        let mut table = two_periods();
        table.push_row("Net Income", vec![None, None]).unwrap();
        table
            .push_values("Net Income Common Stockholders", &[9.0, 11.0])
            .unwrap();
        let group = AliasGroup::new(["Net Income", "Net Income Common Stockholders"]).unwrap();

        let series = resolve(&table, &group);
        assert_eq!(series.values, vec![9.0, 11.0]);
    }

    #[test]
    fn test_missing_policy_is_explicit() {
        let mut table = two_periods();
        table.push_row("Inventory", vec![Some(40.0), None]).unwrap();
        let group = AliasGroup::new(["Inventory"]).unwrap();

        let zero = StatementAccessor::new(MissingPolicy::ZeroFill).resolve(&table, &group);
        assert_eq!(zero.values, vec![40.0, 0.0]);

        let carried = StatementAccessor::new(MissingPolicy::CarryForward).resolve(&table, &group);
        assert_eq!(carried.values, vec![40.0, 40.0]);
    }

    #[test]
    fn test_unmatched_field_is_zero_filled() {
        let table = two_periods().with_row("Total Assets", &[1.0, 2.0]).unwrap();
        let group = AliasGroup::new(["Inventory"]).unwrap();

        let series = resolve(&table, &group);
        assert_eq!(series.values, vec![0.0, 0.0]);
        assert_eq!(series.origin, FieldOrigin::Defaulted);
    }

    #[test]
    fn test_table_without_columns_yields_degenerate_default() {
        let group = AliasGroup::new(["Total Revenue"]).unwrap();
        let series = resolve(&StatementTable::empty(), &group);
        assert_eq!(series.values, vec![0.0; DEGENERATE_PERIODS]);
        assert_eq!(series.origin, FieldOrigin::Degenerate);
    }
}
