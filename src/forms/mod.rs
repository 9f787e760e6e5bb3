//! JSON payloads accepted by the API and their conversion into domain values.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::{TypeConstraintError, clean_optional};

pub mod accounts_payable;
pub mod auth;
pub mod campaigns;
pub mod cases;
pub mod clients;
pub mod companies;
pub mod financial;
pub mod lgpd;
pub mod schedule;
pub mod tags;
pub mod token_shares;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Constraint(#[from] TypeConstraintError),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("{0}")]
    Invalid(String),
}

impl From<FormError> for crate::services::ServiceError {
    fn from(err: FormError) -> Self {
        log::error!("Failed to process form: {err}");
        match err {
            FormError::Validation(_) => Self::Form("Dados inválidos".to_string()),
            FormError::Constraint(err) => Self::TypeConstraint(err.to_string()),
            FormError::InvalidDate(_) | FormError::Invalid(_) => Self::Form(err.to_string()),
        }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339 timestamps.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, FormError> {
    let value = value.trim();
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    parse_date(value).map(|date| date.and_time(chrono::NaiveTime::MIN))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, FormError> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map_err(|_| FormError::InvalidDate(value.to_string()))
}

/// Parses an optional date field, treating blanks as absent.
pub fn parse_optional_datetime(value: Option<&str>) -> Result<Option<NaiveDateTime>, FormError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_datetime(value).map(Some),
        None => Ok(None),
    }
}

pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, FormError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_date(value).map(Some),
        None => Ok(None),
    }
}

/// Inclusive upper bound of a day-granular filter.
pub fn end_of_day(value: &str) -> Result<NaiveDateTime, FormError> {
    let date = parse_date(value)?;
    date.and_hms_opt(23, 59, 59)
        .ok_or_else(|| FormError::InvalidDate(value.to_string()))
}

/// Upper bound of a range filter. A bare date covers the whole day.
pub fn parse_optional_end(value: Option<&str>) -> Result<Option<NaiveDateTime>, FormError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) if value.len() <= 10 => end_of_day(value).map(Some),
        Some(value) => parse_datetime(value).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    clean_optional(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2025-03-10T14:30").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-10T14:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_datetime("2025-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(parse_datetime("amanhã").is_err());
    }

    #[test]
    fn end_of_day_is_inclusive() {
        assert_eq!(
            end_of_day("2025-03-10").unwrap().to_string(),
            "2025-03-10 23:59:59"
        );
    }

    #[test]
    fn range_end_extends_bare_dates() {
        let end = parse_optional_end(Some("10/03/2025")).unwrap().unwrap();
        assert_eq!(end.to_string(), "2025-03-10 23:59:59");
        assert_eq!(parse_optional_end(Some(" ")).unwrap(), None);
    }

    #[test]
    fn blank_optional_dates_are_none() {
        assert_eq!(parse_optional_datetime(Some("  ")).unwrap(), None);
        assert_eq!(parse_optional_date(None).unwrap(), None);
    }
}
