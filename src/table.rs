use crate::error::{RatioEngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub label: String,
    /// One cell per period. `None` is an explicit missing value.
    pub values: Vec<Option<f64>>,
}

impl StatementRow {
    pub fn has_value(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

/// A raw accounting table: rows are line items, columns are reporting periods.
///
/// Every row carries exactly one cell per period. Non-finite numbers are stored
/// as missing so downstream arithmetic only ever sees real values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    periods: Vec<NaiveDate>,
    rows: Vec<StatementRow>,
}

impl StatementTable {
    pub fn new(periods: Vec<NaiveDate>) -> Self {
        Self {
            periods,
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let label = label.into();
        if values.len() != self.periods.len() {
            return Err(RatioEngineError::MalformedTable {
                label,
                expected: self.periods.len(),
                found: values.len(),
            });
        }

        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        self.rows.push(StatementRow { label, values });
        Ok(())
    }

    /// Convenience for fully populated rows.
    pub fn push_values(&mut self, label: impl Into<String>, values: &[f64]) -> Result<()> {
        self.push_row(label, values.iter().copied().map(Some).collect())
    }

    pub fn with_row(mut self, label: impl Into<String>, values: &[f64]) -> Result<Self> {
        self.push_values(label, values)?;
        Ok(self)
    }

    pub fn row(&self, label: &str) -> Option<&StatementRow> {
        self.rows.iter().find(|r| r.label.trim() == label.trim())
    }

    pub(crate) fn row_mut(&mut self, label: &str) -> Option<&mut StatementRow> {
        self.rows.iter_mut().find(|r| r.label.trim() == label.trim())
    }

    pub(crate) fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&StatementRow) -> bool,
    {
        self.rows.retain(keep);
    }

    pub fn value(&self, label: &str, period: NaiveDate) -> Option<f64> {
        let idx = self.periods.iter().position(|p| *p == period)?;
        self.row(label)
            .and_then(|r| r.values.get(idx).copied().flatten())
    }

    /// Checks the row/period invariant. Tables that came in through
    /// deserialization are not validated by construction.
    pub fn validate(&self) -> Result<()> {
        for row in &self.rows {
            if row.values.len() != self.periods.len() {
                return Err(RatioEngineError::MalformedTable {
                    label: row.label.clone(),
                    expected: self.periods.len(),
                    found: row.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Rebuilds the table over a new period axis. `source_index[i]` names the
    /// column of `self` that feeds output column `i`; `None` yields missing cells.
    pub(crate) fn select_columns(
        &self,
        periods: Vec<NaiveDate>,
        source_index: &[Option<usize>],
    ) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| StatementRow {
                label: row.label.clone(),
                values: source_index
                    .iter()
                    .map(|idx| idx.and_then(|i| row.values.get(i).copied().flatten()))
                    .collect(),
            })
            .collect();

        Self { periods, rows }
    }
}
