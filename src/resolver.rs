use crate::accessor::{FieldOrigin, FieldSeries, StatementAccessor};
use crate::aliases::{AliasCatalog, AliasGroup, FieldName};
use crate::aligner::AlignedStatements;
use crate::schema::{MissingPolicy, StatementKind};
use crate::table::StatementTable;
use crate::utils::{clip_non_negative, series_add, series_sub};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reconstruction formula used when a field's own row is absent.
pub struct Fallback<F> {
    formula: &'static str,
    non_negative: bool,
    compute: F,
}

impl<F> Fallback<F>
where
    F: FnOnce() -> Vec<f64>,
{
    pub fn new(formula: &'static str, compute: F) -> Self {
        Self {
            formula,
            non_negative: false,
            compute,
        }
    }

    /// For fields that can never be negative (liabilities, current assets, ...).
    pub fn non_negative(formula: &'static str, compute: F) -> Self {
        Self {
            formula,
            non_negative: true,
            compute,
        }
    }

    fn evaluate(self) -> FieldSeries {
        let values = (self.compute)();
        FieldSeries {
            values: if self.non_negative {
                clip_non_negative(values)
            } else {
                values
            },
            origin: FieldOrigin::Derived {
                formula: self.formula.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedFieldResolver {
    accessor: StatementAccessor,
}

impl DerivedFieldResolver {
    pub fn new(policy: MissingPolicy) -> Self {
        Self {
            accessor: StatementAccessor::new(policy),
        }
    }

    /// Resolves through the aliases first. A series whose absolute values sum
    /// to zero is treated as absent and replaced by the fallback formula, so
    /// mixed-sign vendor rows never cancel out into a false fallback.
    pub fn resolve_with_fallback<F>(
        &self,
        table: &StatementTable,
        aliases: &AliasGroup,
        fallback: Fallback<F>,
    ) -> FieldSeries
    where
        F: FnOnce() -> Vec<f64>,
    {
        let primary = self.accessor.resolve(table, aliases);
        if primary.values.iter().map(|v| v.abs()).sum::<f64>() != 0.0 {
            return primary;
        }

        debug!(
            "Aliases {:?} resolved to an all-zero series; falling back to '{}'",
            aliases.labels(),
            fallback.formula
        );
        fallback.evaluate()
    }

    /// Resolves every [`FieldName`] from its statement, siblings before the
    /// fields whose fallbacks depend on them.
    pub fn resolve_all(&self, aligned: &AlignedStatements, catalog: &AliasCatalog) -> ResolvedFields {
        let mut fields = ResolvedFields::new(aligned.period_count());

        let direct = |field: FieldName| {
            let table = statement_for(aligned, field.statement());
            self.accessor.resolve(table, &catalog.group(field))
        };

        for field in [
            FieldName::Revenue,
            FieldName::NetIncome,
            FieldName::Ebit,
            FieldName::GrossProfit,
            FieldName::PretaxIncome,
            FieldName::TotalAssets,
            FieldName::Equity,
            FieldName::Cash,
            FieldName::Receivables,
            FieldName::Inventory,
            FieldName::Payables,
            FieldName::TotalDebt,
            FieldName::LongTermDebt,
            FieldName::OperatingCashFlow,
        ] {
            fields.insert(field, direct(field));
        }

        // Vendors disagree on the sign of outflows.
        fields.insert(FieldName::DividendsPaid, direct(FieldName::DividendsPaid).abs());

        let interest = self
            .resolve_with_fallback(
                &aligned.income,
                &catalog.group(FieldName::InterestExpense),
                Fallback::non_negative("ebit - pretax_income", || {
                    let pretax = fields.values(FieldName::PretaxIncome);
                    // Without a pretax line the difference would just be EBIT.
                    if pretax.iter().all(|v| *v == 0.0) {
                        return vec![0.0; fields.period_count()];
                    }
                    series_sub(fields.values(FieldName::Ebit), pretax)
                }),
            )
            .abs();
        fields.insert(FieldName::InterestExpense, interest);

        let short_term_debt = self.resolve_with_fallback(
            &aligned.balance,
            &catalog.group(FieldName::ShortTermDebt),
            Fallback::non_negative("total_debt - long_term_debt", || {
                series_sub(fields.values(FieldName::TotalDebt), fields.values(FieldName::LongTermDebt))
            }),
        );
        fields.insert(FieldName::ShortTermDebt, short_term_debt);

        let liabilities = self.resolve_with_fallback(
            &aligned.balance,
            &catalog.group(FieldName::TotalLiabilities),
            Fallback::non_negative("total_assets - equity", || {
                series_sub(fields.values(FieldName::TotalAssets), fields.values(FieldName::Equity))
            }),
        );
        fields.insert(FieldName::TotalLiabilities, liabilities);

        let current_assets = self.resolve_with_fallback(
            &aligned.balance,
            &catalog.group(FieldName::CurrentAssets),
            Fallback::non_negative("cash + receivables + inventory", || {
                let partial = series_add(fields.values(FieldName::Cash), fields.values(FieldName::Receivables));
                series_add(&partial, fields.values(FieldName::Inventory))
            }),
        );
        fields.insert(FieldName::CurrentAssets, current_assets);

        let current_liabilities = self.resolve_with_fallback(
            &aligned.balance,
            &catalog.group(FieldName::CurrentLiabilities),
            Fallback::non_negative("payables + short_term_debt", || {
                series_add(fields.values(FieldName::Payables), fields.values(FieldName::ShortTermDebt))
            }),
        );
        fields.insert(FieldName::CurrentLiabilities, current_liabilities);

        fields
    }
}

fn statement_for(aligned: &AlignedStatements, kind: StatementKind) -> &StatementTable {
    match kind {
        StatementKind::Income => &aligned.income,
        StatementKind::Balance => &aligned.balance,
        StatementKind::CashFlow => &aligned.cashflow,
    }
}

/// Every field the metrics need, on the aligned period axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFields {
    period_count: usize,
    fields: BTreeMap<FieldName, FieldSeries>,
}

impl ResolvedFields {
    pub fn new(period_count: usize) -> Self {
        Self {
            period_count,
            fields: BTreeMap::new(),
        }
    }

    /// Builds a field set from plain values. Fields not listed are zero.
    pub fn from_values<I>(period_count: usize, values: I) -> Self
    where
        I: IntoIterator<Item = (FieldName, Vec<f64>)>,
    {
        let mut fields = Self::new(period_count);
        for (field, values) in values {
            fields.insert(
                field,
                FieldSeries {
                    values,
                    origin: FieldOrigin::Reported {
                        label: field.as_str().to_string(),
                    },
                },
            );
        }
        fields
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    pub fn insert(&mut self, field: FieldName, series: FieldSeries) {
        self.fields.insert(field, series);
    }

    pub fn get(&self, field: FieldName) -> Option<&FieldSeries> {
        self.fields.get(&field)
    }

    /// Values of `field`, or an empty slice when it was never resolved.
    pub fn values(&self, field: FieldName) -> &[f64] {
        self.fields
            .get(&field)
            .map(|s| s.values.as_slice())
            .unwrap_or(&[])
    }

    /// Value of `field` at `idx`; unresolved fields and gaps read as 0.0.
    pub fn at(&self, field: FieldName, idx: usize) -> f64 {
        self.values(field).get(idx).copied().unwrap_or(0.0)
    }

    pub fn origin(&self, field: FieldName) -> Option<&FieldOrigin> {
        self.fields.get(&field).map(|s| &s.origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldSeries)> {
        self.fields.iter()
    }
}
