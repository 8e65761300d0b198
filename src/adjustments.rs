use crate::error::Result;
use crate::schema::StatementKind;
use crate::table::StatementTable;
use crate::utils::parse_period_date;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label clean-ups for one vendor's tables, grouped by statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatementAdjustments {
    #[serde(default)]
    pub income: Vec<LabelAdjustment>,

    #[serde(default)]
    pub balance: Vec<LabelAdjustment>,

    #[serde(default)]
    pub cashflow: Vec<LabelAdjustment>,
}

impl StatementAdjustments {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.balance.is_empty() && self.cashflow.is_empty()
    }

    pub fn for_statement(&self, kind: StatementKind) -> &[LabelAdjustment] {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &self.cashflow,
        }
    }

    pub fn push(&mut self, kind: StatementKind, adjustment: LabelAdjustment) {
        match kind {
            StatementKind::Income => self.income.push(adjustment),
            StatementKind::Balance => self.balance.push(adjustment),
            StatementKind::CashFlow => self.cashflow.push(adjustment),
        }
    }

    /// Returns an adjusted copy; `table` itself is left untouched.
    pub fn apply(&self, kind: StatementKind, table: &StatementTable) -> Result<StatementTable> {
        apply_adjustments(table, self.for_statement(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LabelAdjustment {
    /// Rename a row (e.g. a vendor's 'Revenues' -> 'Total Revenue').
    Rename {
        #[schemars(description = "The current row label (whitespace-trimmed match).")]
        target: String,
        new_label: String,
    },

    /// Sum several rows into one. Sources are removed; a period where every
    /// source is missing stays missing.
    Merge {
        sources: Vec<String>,
        #[schemars(description = "Label of the merged row. Replaces an existing row with that label.")]
        target: String,
    },

    /// Remove a row entirely.
    Delete { target: String },

    /// Multiply every value by a factor (e.g. -1.0 to flip sign, 1000.0 for thousands).
    Scale { target: String, factor: f64 },

    /// Set a single cell. Creates the row when absent.
    SetValue {
        target: String,
        #[schemars(description = "Period end, YYYY-MM-DD / YYYY-MM / YYYY. Must exist on the table's axis.")]
        period: String,
        value: f64,
    },
}

pub fn apply_adjustments(
    table: &StatementTable,
    adjustments: &[LabelAdjustment],
) -> Result<StatementTable> {
    // Deserialized tables can break the row/period invariant; cell edits index by period.
    table.validate()?;

    let mut adjusted = table.clone();
    for adjustment in adjustments {
        apply_single_adjustment(&mut adjusted, adjustment)?;
    }
    Ok(adjusted)
}

fn apply_single_adjustment(table: &mut StatementTable, adjustment: &LabelAdjustment) -> Result<()> {
    match adjustment {
        LabelAdjustment::Rename { target, new_label } => match table.row_mut(target) {
            Some(row) => row.label = new_label.clone(),
            None => debug!("Rename skipped: no row '{}'", target),
        },

        LabelAdjustment::Delete { target } => {
            table.retain_rows(|row| row.label.trim() != target.trim());
        }

        LabelAdjustment::Scale { target, factor } => match table.row_mut(target) {
            Some(row) => {
                for value in row.values.iter_mut().flatten() {
                    *value *= factor;
                }
            }
            None => debug!("Scale skipped: no row '{}'", target),
        },

        LabelAdjustment::SetValue {
            target,
            period,
            value,
        } => {
            let date = parse_period_date(period)?;
            let Some(idx) = table.periods().iter().position(|p| *p == date) else {
                debug!("SetValue skipped: period {} not on the axis", date);
                return Ok(());
            };

            if table.row(target).is_none() {
                table.push_row(target.clone(), vec![None; table.period_count()])?;
            }
            if let Some(row) = table.row_mut(target) {
                row.values[idx] = Some(*value).filter(|v| v.is_finite());
            }
        }

        LabelAdjustment::Merge { sources, target } => merge_rows(table, sources, target)?,
    }

    Ok(())
}

fn merge_rows(table: &mut StatementTable, sources: &[String], target: &str) -> Result<()> {
    let is_source = |label: &str| sources.iter().any(|s| s.trim() == label.trim());

    let mut merged: Vec<Option<f64>> = vec![None; table.period_count()];
    let mut found = false;
    for row in table.rows().iter().filter(|r| is_source(&r.label)) {
        found = true;
        for (slot, value) in merged.iter_mut().zip(&row.values) {
            if let Some(v) = value {
                *slot = Some(slot.unwrap_or(0.0) + v);
            }
        }
    }

    if !found {
        debug!("Merge skipped: none of {:?} present", sources);
        return Ok(());
    }

    table.retain_rows(|row| !is_source(&row.label) && row.label.trim() != target.trim());
    table.push_row(target.to_string(), merged)
}
