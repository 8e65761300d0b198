use crate::aliases::FieldName;
use crate::error::{RatioEngineError, Result};
use crate::resolver::ResolvedFields;
use log::warn;
use serde::{Deserialize, Serialize};

/// A period where reported assets disagree with liabilities + equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityWarning {
    pub period: String,
    pub assets: f64,
    pub liabilities: f64,
    pub equity: f64,
    /// `|assets - (liabilities + equity)| / |assets|`
    pub relative_difference: f64,
}

/// Checks `assets = liabilities + equity` on reported rows only. Derived
/// liabilities satisfy the identity by construction, so they are skipped.
pub struct BalanceIdentityCheck<'a> {
    fields: &'a ResolvedFields,
    labels: &'a [String],
}

impl<'a> BalanceIdentityCheck<'a> {
    pub fn new(fields: &'a ResolvedFields, labels: &'a [String]) -> Self {
        Self { fields, labels }
    }

    pub fn warnings(&self, tolerance: f64) -> Vec<IdentityWarning> {
        let reported = |field: FieldName| {
            self.fields
                .origin(field)
                .is_some_and(|origin| origin.is_reported())
        };

        if !(reported(FieldName::TotalAssets)
            && reported(FieldName::TotalLiabilities)
            && reported(FieldName::Equity))
        {
            return Vec::new();
        }

        let mut warnings = Vec::new();
        for (idx, period) in self.labels.iter().enumerate() {
            let assets = self.fields.at(FieldName::TotalAssets, idx);
            let liabilities = self.fields.at(FieldName::TotalLiabilities, idx);
            let equity = self.fields.at(FieldName::Equity, idx);

            if assets == 0.0 {
                continue;
            }

            let relative_difference = (assets - (liabilities + equity)).abs() / assets.abs();
            if relative_difference > tolerance {
                warn!(
                    "Balance sheet identity off by {:.2}% in {}: assets {} vs liabilities {} + equity {}",
                    relative_difference * 100.0,
                    period,
                    assets,
                    liabilities,
                    equity
                );
                warnings.push(IdentityWarning {
                    period: period.clone(),
                    assets,
                    liabilities,
                    equity,
                    relative_difference,
                });
            }
        }

        warnings
    }

    /// Strict variant: the first deviation beyond `tolerance` is an error.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        match self.warnings(tolerance).into_iter().next() {
            Some(w) => Err(RatioEngineError::BalanceIdentityViolation {
                period: w.period,
                assets: w.assets,
                liabilities: w.liabilities,
                equity: w.equity,
            }),
            None => Ok(()),
        }
    }
}

pub fn check_balance_identity(
    fields: &ResolvedFields,
    labels: &[String],
    tolerance: f64,
) -> Vec<IdentityWarning> {
    BalanceIdentityCheck::new(fields, labels).warnings(tolerance)
}

pub fn verify_balance_identity(
    fields: &ResolvedFields,
    labels: &[String],
    tolerance: f64,
) -> Result<()> {
    BalanceIdentityCheck::new(fields, labels).verify(tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FieldOrigin, FieldSeries};

    fn labels() -> Vec<String> {
        vec!["2022-12".to_string(), "2023-12".to_string()]
    }

    #[test]
    fn test_consistent_balance_sheet_passes() {
        let fields = ResolvedFields::from_values(
            2,
            [
                (FieldName::TotalAssets, vec![200.0, 220.0]),
                (FieldName::TotalLiabilities, vec![120.0, 130.0]),
                (FieldName::Equity, vec![80.0, 90.0]),
            ],
        );
        assert!(check_balance_identity(&fields, &labels(), 0.01).is_empty());
        assert!(verify_balance_identity(&fields, &labels(), 0.01).is_ok());
    }

    #[test]
    fn test_inconsistent_period_is_reported() {
        let fields = ResolvedFields::from_values(
            2,
            [
                (FieldName::TotalAssets, vec![200.0, 220.0]),
                (FieldName::TotalLiabilities, vec![120.0, 100.0]),
                (FieldName::Equity, vec![80.0, 90.0]),
            ],
        );
        let warnings = check_balance_identity(&fields, &labels(), 0.01);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].period, "2023-12");

        let err = verify_balance_identity(&fields, &labels(), 0.01).unwrap_err();
        assert!(matches!(err, RatioEngineError::BalanceIdentityViolation { .. }));
    }

    #[test]
    fn test_derived_liabilities_are_skipped() {
        let mut fields = ResolvedFields::from_values(
            2,
            [
                (FieldName::TotalAssets, vec![200.0, 220.0]),
                (FieldName::Equity, vec![80.0, 90.0]),
            ],
        );
        fields.insert(
            FieldName::TotalLiabilities,
            FieldSeries {
                values: vec![0.0, 0.0],
                origin: FieldOrigin::Derived {
                    formula: "total_assets - equity".to_string(),
                },
            },
        );
        assert!(check_balance_identity(&fields, &labels(), 0.0).is_empty());
    }
}
