use crate::error::Result;
use crate::table::StatementTable;
use crate::utils::parse_period_date;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A cell as vendors hand it over: sometimes a number, sometimes a string
/// with a placeholder such as `-` or `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Empty,
}

const MISSING_PLACEHOLDERS: [&str; 7] = ["", "-", "--", "—", "n/a", "na", "nan"];

impl RawCell {
    pub fn to_value(&self) -> Option<f64> {
        match self {
            RawCell::Number(v) => Some(*v).filter(|v| v.is_finite()),
            RawCell::Empty => None,
            RawCell::Text(text) => parse_cell_text(text),
        }
    }
}

fn parse_cell_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if MISSING_PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }

    // Accounting notation: (1,234) is -1234.
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body.chars().filter(|c| *c != ',' && *c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(if negative { -v } else { v }),
        _ => {
            debug!("Unparsable cell '{}' treated as missing", text);
            None
        }
    }
}

/// Long-form vendor record: one line item value for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub label: String,
    /// Period end as `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
    pub period_end: String,
    pub value: RawCell,
}

impl StatementRecord {
    pub fn new(label: impl Into<String>, period_end: impl Into<String>, value: RawCell) -> Self {
        Self {
            label: label.into(),
            period_end: period_end.into(),
            value,
        }
    }
}

/// Pivots long-form records into a table. Distinct period ends become the
/// axis, rows keep first-seen order, and for duplicate cells the first
/// non-missing value wins.
pub fn table_from_records(records: &[StatementRecord]) -> Result<StatementTable> {
    let mut parsed: Vec<(&str, NaiveDate, Option<f64>)> = Vec::with_capacity(records.len());
    for record in records {
        let date = parse_period_date(&record.period_end)?;
        parsed.push((record.label.trim(), date, record.value.to_value()));
    }

    let periods: Vec<NaiveDate> = parsed
        .iter()
        .map(|(_, date, _)| *date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut labels: Vec<&str> = Vec::new();
    for (label, _, _) in &parsed {
        if !labels.contains(label) {
            labels.push(*label);
        }
    }

    let mut table = StatementTable::new(periods.clone());
    for label in labels {
        let mut values: Vec<Option<f64>> = vec![None; periods.len()];
        for (_, date, value) in parsed.iter().filter(|(l, _, _)| *l == label) {
            if let Ok(idx) = periods.binary_search(date) {
                if values[idx].is_none() {
                    values[idx] = *value;
                }
            }
        }
        table.push_row(label, values)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_placeholders_become_missing() {
        assert_eq!(RawCell::Text("-".to_string()).to_value(), None);
        assert_eq!(RawCell::Text(" N/A ".to_string()).to_value(), None);
        assert_eq!(RawCell::Text("nan".to_string()).to_value(), None);
        assert_eq!(RawCell::Text("abc".to_string()).to_value(), None);
        assert_eq!(RawCell::Empty.to_value(), None);
        assert_eq!(RawCell::Number(f64::NAN).to_value(), None);
    }

    #[test]
    fn test_cell_numbers_parse() {
        assert_eq!(RawCell::Number(12.5).to_value(), Some(12.5));
        assert_eq!(RawCell::Text("1,234.5".to_string()).to_value(), Some(1234.5));
        assert_eq!(RawCell::Text("(300)".to_string()).to_value(), Some(-300.0));
        assert_eq!(RawCell::Text("-42".to_string()).to_value(), Some(-42.0));
    }

    #[test]
    fn test_cells_deserialize_untagged() {
        let cells: Vec<RawCell> = serde_json::from_str(r#"[1.5, "-", null]"#).unwrap();
        assert_eq!(cells[0].to_value(), Some(1.5));
        assert_eq!(cells[1].to_value(), None);
        assert_eq!(cells[2], RawCell::Empty);
    }

    #[test]
    fn test_table_from_records() {
        let records = vec![
            StatementRecord::new("Total Revenue", "2023-12-31", RawCell::Number(120.0)),
            StatementRecord::new("Total Revenue", "2022-12-31", RawCell::Number(100.0)),
            StatementRecord::new("Net Income", "2023-12-31", RawCell::Text("-".to_string())),
            StatementRecord::new("Net Income", "2023-12-31", RawCell::Text("15".to_string())),
            StatementRecord::new("Net Income", "2022-12", RawCell::Number(10.0)),
        ];

        let table = table_from_records(&records).unwrap();
        assert_eq!(
            table.periods(),
            &[
                NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
            ]
        );
        assert_eq!(table.rows()[0].label, "Total Revenue");
        assert_eq!(
            table.row("Total Revenue").unwrap().values,
            vec![Some(100.0), Some(120.0)]
        );
        assert_eq!(
            table.row("Net Income").unwrap().values,
            vec![Some(10.0), Some(15.0)]
        );
    }

    #[test]
    fn test_bad_period_is_an_error() {
        let records = vec![StatementRecord::new("Revenue", "FY23", RawCell::Number(1.0))];
        assert!(table_from_records(&records).is_err());
    }
}
