use crate::error::{RatioEngineError, Result};
use chrono::{Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

/// Parses a period end written as `YYYY-MM-DD`, `YYYY-MM` (month end) or
/// `YYYY` (December 31st). Vendors that export timestamps (`2023-12-31 00:00:00`)
/// are accepted too; the time part is dropped.
pub fn parse_period_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Ok(date);
    }

    let invalid = || {
        RatioEngineError::DateError(format!(
            "Invalid period date '{}'. Expected YYYY-MM-DD, YYYY-MM or YYYY",
            raw
        ))
    };

    let parts: Vec<&str> = date_part.split('-').collect();
    match parts.as_slice() {
        [year, month] => {
            let year = year.parse::<i32>().map_err(|_| invalid())?;
            let month = month.parse::<u32>().map_err(|_| invalid())?;
            last_day_of_month(year, month).ok_or_else(invalid)
        }
        [year] if year.len() == 4 => {
            let year = year.parse::<i32>().map_err(|_| invalid())?;
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

pub fn series_add(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_longest(a, b, |x, y| x + y)
}

pub fn series_sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_longest(a, b, |x, y| x - y)
}

pub fn clip_non_negative(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().map(|v| v.max(0.0)).collect()
}

/// Element-wise combination; the shorter side reads as 0.0 past its end.
fn zip_longest<F>(a: &[f64], b: &[f64], op: F) -> Vec<f64>
where
    F: Fn(f64, f64) -> f64,
{
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            op(
                a.get(i).copied().unwrap_or(0.0),
                b.get(i).copied().unwrap_or(0.0),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert_eq!(last_day_of_month(2023, 13), None);
    }

    #[test]
    fn test_parse_period_date_formats() {
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(parse_period_date("2023-12-31").unwrap(), dec);
        assert_eq!(parse_period_date("2023-12-31 00:00:00").unwrap(), dec);
        assert_eq!(parse_period_date("2023-12-31T00:00:00").unwrap(), dec);
        assert_eq!(parse_period_date(" 2023-12 ").unwrap(), dec);
        assert_eq!(parse_period_date("2023").unwrap(), dec);
        assert_eq!(
            parse_period_date("2024-06").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
        );

        assert!(parse_period_date("FY2023").is_err());
        assert!(parse_period_date("2023-13").is_err());
        assert!(parse_period_date("").is_err());
    }

    #[test]
    fn test_series_ops_pad_shorter_side() {
        assert_eq!(series_add(&[1.0, 2.0], &[10.0]), vec![11.0, 2.0]);
        assert_eq!(series_sub(&[5.0], &[1.0, 1.0]), vec![4.0, -1.0]);
        assert_eq!(clip_non_negative(vec![-1.0, 0.0, 2.0]), vec![0.0, 0.0, 2.0]);
    }
}
