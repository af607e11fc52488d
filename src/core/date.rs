//! Normalization of free-text origin dates into `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.

use crate::core::resolver::MappingGap;
use crate::domain::outcome::ReasonCode;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Inputs longer than this are tried as full timestamps first.
const LOCAL_DATE_MAX_LENGTH: usize = 12;

static YEAR_PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{4})$").unwrap());
static UNCERTAIN_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})\?$").unwrap());
static OPEN_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-$").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-.](\d{1,2})$").unwrap());
static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-.](\d{1,2})[-.](\d{1,2})$").unwrap());
static TARGET_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01]))?)?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    Year,
    YearMonth,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDate {
    pub value: String,
    pub precision: DatePrecision,
    /// Every loss of precision taken on the way, in the order it happened.
    pub degradations: Vec<ReasonCode>,
}

/// Whether `value` already has the shape the target system accepts.
pub fn is_target_date(value: &str) -> bool {
    TARGET_FORMAT.is_match(value)
}

pub fn normalize_date(origin: &str) -> Result<NormalizedDate, MappingGap> {
    let mut degradations = Vec::new();
    let mut value: String = origin
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\u{2013}' || c == '\u{2014}' { '-' } else { c })
        .collect();

    if value.is_empty() {
        return Err(MappingGap::new(origin, ReasonCode::EmptyValue));
    }

    if value.len() > LOCAL_DATE_MAX_LENGTH {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(&value) {
            value = timestamp
                .with_timezone(&Utc)
                .date_naive()
                .format("%Y-%m-%d")
                .to_string();
            degradations.push(ReasonCode::TimestampTruncated);
        }
    }

    if let Some(caps) = YEAR_PERIOD.captures(&value) {
        value = caps[1].to_string();
        degradations.push(ReasonCode::PeriodCollapsed);
    } else if let Some(caps) = UNCERTAIN_YEAR.captures(&value) {
        value = caps[1].to_string();
        degradations.push(ReasonCode::UncertainDate);
    } else if let Some(caps) = OPEN_YEAR.captures(&value) {
        value = caps[1].to_string();
    }

    if YEAR.is_match(&value) {
        degradations.push(ReasonCode::YearOnlyDate);
        return Ok(NormalizedDate {
            value,
            precision: DatePrecision::Year,
            degradations,
        });
    }

    if let Some(caps) = YEAR_MONTH.captures(&value) {
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| MappingGap::new(origin, ReasonCode::MalformedValue))?;
        if !(1..=12).contains(&month) {
            return Err(MappingGap::new(origin, ReasonCode::MalformedValue));
        }
        degradations.push(ReasonCode::YearMonthDate);
        return Ok(NormalizedDate {
            value: format!("{}-{:02}", &caps[1], month),
            precision: DatePrecision::YearMonth,
            degradations,
        });
    }

    if let Some(caps) = FULL_DATE.captures(&value) {
        let parsed = match (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        ) {
            (Ok(year), Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day),
            _ => None,
        };
        return match parsed {
            Some(date) => Ok(NormalizedDate {
                value: date.format("%Y-%m-%d").to_string(),
                precision: DatePrecision::Day,
                degradations,
            }),
            None => Err(MappingGap::new(origin, ReasonCode::MalformedValue)),
        };
    }

    Err(MappingGap::new(origin, ReasonCode::MalformedValue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dates_pass_through_without_degradation() {
        let date = normalize_date("2019-03-07").unwrap();
        assert_eq!(date.value, "2019-03-07");
        assert_eq!(date.precision, DatePrecision::Day);
        assert!(date.degradations.is_empty());

        let dotted = normalize_date("2019.3.7").unwrap();
        assert_eq!(dotted.value, "2019-03-07");
    }

    #[test]
    fn test_partial_dates_degrade_instead_of_failing() {
        let year = normalize_date(" 2004 ").unwrap();
        assert_eq!(year.value, "2004");
        assert_eq!(year.degradations, vec![ReasonCode::YearOnlyDate]);

        let month = normalize_date("2004-6").unwrap();
        assert_eq!(month.value, "2004-06");
        assert_eq!(month.precision, DatePrecision::YearMonth);
        assert_eq!(month.degradations, vec![ReasonCode::YearMonthDate]);
    }

    #[test]
    fn test_periods_and_uncertain_years_collapse_to_first_year() {
        let period = normalize_date("1998\u{2013}2001").unwrap();
        assert_eq!(period.value, "1998");
        assert_eq!(
            period.degradations,
            vec![ReasonCode::PeriodCollapsed, ReasonCode::YearOnlyDate]
        );

        let uncertain = normalize_date("1870?").unwrap();
        assert_eq!(uncertain.value, "1870");
        assert_eq!(
            uncertain.degradations,
            vec![ReasonCode::UncertainDate, ReasonCode::YearOnlyDate]
        );

        assert_eq!(normalize_date("1999-").unwrap().value, "1999");
    }

    #[test]
    fn test_timestamps_truncate_to_utc_date() {
        let date = normalize_date("2020-12-31T23:30:00-02:00").unwrap();
        assert_eq!(date.value, "2021-01-01");
        assert_eq!(date.degradations, vec![ReasonCode::TimestampTruncated]);
    }

    #[test]
    fn test_impossible_or_free_text_dates_are_gaps() {
        assert_eq!(
            normalize_date("2019-02-30").unwrap_err().reason,
            ReasonCode::MalformedValue
        );
        assert_eq!(
            normalize_date("2019-13").unwrap_err().reason,
            ReasonCode::MalformedValue
        );
        assert_eq!(
            normalize_date("spring term").unwrap_err().reason,
            ReasonCode::MalformedValue
        );
        assert_eq!(normalize_date("  ").unwrap_err().reason, ReasonCode::EmptyValue);
    }

    #[test]
    fn test_target_format_check() {
        assert!(is_target_date("2004"));
        assert!(is_target_date("2004-06"));
        assert!(is_target_date("2004-06-30"));
        assert!(!is_target_date("2004-6"));
        assert!(!is_target_date("30.06.2004"));
        assert!(!is_target_date(""));
    }
}
