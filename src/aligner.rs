use crate::error::{RatioEngineError, Result};
use crate::schema::{PeriodFilter, PeriodLabelFormat, Window};
use crate::table::StatementTable;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignOptions {
    pub window: Window,
    pub filter: Option<PeriodFilter>,
    pub label_format: PeriodLabelFormat,
}

/// The three statements on one shared, strictly increasing period axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedStatements {
    pub income: StatementTable,
    pub balance: StatementTable,
    pub cashflow: StatementTable,
    pub period_ends: Vec<NaiveDate>,
    pub labels: Vec<String>,
}

impl AlignedStatements {
    pub fn period_count(&self) -> usize {
        self.labels.len()
    }
}

pub struct PeriodAligner {
    options: AlignOptions,
}

impl PeriodAligner {
    pub fn new(options: AlignOptions) -> Self {
        Self { options }
    }

    pub fn align(
        &self,
        raw_income: &StatementTable,
        raw_balance: &StatementTable,
        raw_cashflow: &StatementTable,
    ) -> Result<AlignedStatements> {
        if let Window::Trailing(0) = self.options.window {
            return Err(RatioEngineError::InvalidRequest(
                "Trailing window must keep at least one period".to_string(),
            ));
        }

        let income = sort_columns(raw_income)?;

        // The window counts filtered periods.
        let candidates: Vec<NaiveDate> = income
            .periods()
            .iter()
            .copied()
            .filter(|d| self.options.filter.map_or(true, |f| f.matches(*d)))
            .collect();

        // The window counts labelled periods, so collisions collapse first.
        let (mut period_ends, mut labels) = self.label_axis(&candidates);
        if let Window::Trailing(n) = self.options.window {
            if labels.len() > n {
                let excess = labels.len() - n;
                period_ends.drain(..excess);
                labels.drain(..excess);
            }
        }

        if period_ends.is_empty() {
            return Err(RatioEngineError::InsufficientData);
        }

        debug!(
            "Aligned {} income periods ({} -> {})",
            labels.len(),
            labels.first().map(String::as_str).unwrap_or_default(),
            labels.last().map(String::as_str).unwrap_or_default()
        );

        let income = self.reindex(&income, &period_ends, &labels);
        let balance = self.reindex(&sort_columns(raw_balance)?, &period_ends, &labels);
        let cashflow = self.reindex(&sort_columns(raw_cashflow)?, &period_ends, &labels);

        Ok(AlignedStatements {
            income,
            balance,
            cashflow,
            period_ends,
            labels,
        })
    }

    /// Labels the axis; on a label collision the later period replaces the earlier one.
    fn label_axis(&self, dates: &[NaiveDate]) -> (Vec<NaiveDate>, Vec<String>) {
        let mut period_ends: Vec<NaiveDate> = Vec::with_capacity(dates.len());
        let mut labels: Vec<String> = Vec::with_capacity(dates.len());

        for &date in dates {
            let label = self.options.label_format.label(date);
            if labels.last() == Some(&label) {
                debug!("Period label {} collides; keeping {}", label, date);
                period_ends.pop();
                labels.pop();
            }
            period_ends.push(date);
            labels.push(label);
        }

        (period_ends, labels)
    }

    fn reindex(
        &self,
        sorted: &StatementTable,
        period_ends: &[NaiveDate],
        labels: &[String],
    ) -> StatementTable {
        // Later columns overwrite earlier ones, so the latest period wins per label.
        let by_label: HashMap<String, usize> = sorted
            .periods()
            .iter()
            .enumerate()
            .map(|(idx, d)| (self.options.label_format.label(*d), idx))
            .collect();

        let source_index: Vec<Option<usize>> =
            labels.iter().map(|l| by_label.get(l).copied()).collect();

        sorted.select_columns(period_ends.to_vec(), &source_index)
    }
}

/// Convenience wrapper around [`PeriodAligner`].
pub fn align(
    raw_income: &StatementTable,
    raw_balance: &StatementTable,
    raw_cashflow: &StatementTable,
    options: AlignOptions,
) -> Result<AlignedStatements> {
    PeriodAligner::new(options).align(raw_income, raw_balance, raw_cashflow)
}

/// Sorts columns ascending by period end. Duplicate dates collapse into one
/// column holding the first non-missing value of each row.
fn sort_columns(table: &StatementTable) -> Result<StatementTable> {
    table.validate()?;

    let mut dates = table.periods().to_vec();
    dates.sort();
    dates.dedup();

    let mut sorted = StatementTable::new(dates.clone());
    for row in table.rows() {
        let values = dates
            .iter()
            .map(|date| {
                table
                    .periods()
                    .iter()
                    .zip(&row.values)
                    .filter(|(p, _)| *p == date)
                    .find_map(|(_, v)| *v)
            })
            .collect();
        sorted.push_row(row.label.clone(), values)?;
    }

    Ok(sorted)
}
