use crate::error::Result;
use crate::schema::{Frequency, StatementKind};
use crate::table::StatementTable;
use std::collections::HashMap;

/// The data-provider collaborator. Returning an empty table is the normal way
/// to say "nothing found"; errors are reserved for transport failures.
pub trait StatementProvider {
    fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<StatementTable>;
}

impl<P: StatementProvider + ?Sized> StatementProvider for &P {
    fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<StatementTable> {
        (**self).fetch_statement(ticker, kind, frequency)
    }
}

/// Tables held in memory, keyed by ticker, statement and frequency.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    tables: HashMap<(String, StatementKind, Frequency), StatementTable>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        ticker: impl Into<String>,
        kind: StatementKind,
        frequency: Frequency,
        table: StatementTable,
    ) {
        self.tables
            .insert((normalize_ticker(&ticker.into()), kind, frequency), table);
    }

    pub fn with_table(
        mut self,
        ticker: impl Into<String>,
        kind: StatementKind,
        frequency: Frequency,
        table: StatementTable,
    ) -> Self {
        self.insert(ticker, kind, frequency, table);
        self
    }
}

impl StatementProvider for InMemoryProvider {
    fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<StatementTable> {
        Ok(self
            .tables
            .get(&(normalize_ticker(ticker), kind, frequency))
            .cloned()
            .unwrap_or_default())
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_unknown_key_returns_empty_table() {
        let provider = InMemoryProvider::new();
        let table = provider
            .fetch_statement("NVDA", StatementKind::Income, Frequency::Annual)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_lookup_is_ticker_case_insensitive() {
        let table = StatementTable::new(vec![NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()])
            .with_row("Total Revenue", &[10.0])
            .unwrap();
        let provider = InMemoryProvider::new().with_table(
            "605499.ss",
            StatementKind::Income,
            Frequency::Quarterly,
            table.clone(),
        );

        let fetched = provider
            .fetch_statement(" 605499.SS ", StatementKind::Income, Frequency::Quarterly)
            .unwrap();
        assert_eq!(fetched, table);

        let other_frequency = provider
            .fetch_statement("605499.SS", StatementKind::Income, Frequency::Annual)
            .unwrap();
        assert!(other_frequency.is_empty());
    }
}
