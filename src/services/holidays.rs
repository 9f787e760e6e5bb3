use chrono::{Datelike, NaiveDateTime};

use crate::domain::holiday::{Holiday, holidays_between, holidays_for_year};
use crate::dto::holidays::{HolidayRangeParams, HolidayYearParams};
use crate::forms::parse_date;
use crate::services::{ServiceError, ServiceResult};

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2200;
/// Widest range accepted by [`holidays_in_range`], in years.
const MAX_RANGE_YEARS: i32 = 10;

fn check_year(year: i32) -> ServiceResult<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ServiceError::Form("Ano inválido".to_string()))
    }
}

/// National holidays of the requested year, defaulting to the current one.
pub fn holidays_of_year(
    params: HolidayYearParams,
    now: NaiveDateTime,
) -> ServiceResult<Vec<Holiday>> {
    let year = check_year(params.year.unwrap_or_else(|| now.year()))?;
    Ok(holidays_for_year(year))
}

pub fn holidays_in_range(params: HolidayRangeParams) -> ServiceResult<Vec<Holiday>> {
    let start = parse_date(&params.start)?;
    let end = parse_date(&params.end)?;
    if end < start {
        return Err(ServiceError::Form(
            "Data final deve ser posterior à inicial".to_string(),
        ));
    }
    check_year(start.year())?;
    check_year(end.year())?;
    if end.year() - start.year() > MAX_RANGE_YEARS {
        return Err(ServiceError::Form("Intervalo muito longo".to_string()));
    }
    Ok(holidays_between(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::at;

    #[test]
    fn defaults_to_current_year() {
        let holidays =
            holidays_of_year(HolidayYearParams::default(), at("2025-06-01 12:00")).unwrap();
        assert!(holidays.iter().all(|h| h.date.year() == 2025));
        assert!(holidays.iter().any(|h| h.name == "Tiradentes"));
    }

    #[test]
    fn range_spans_new_year() {
        let holidays = holidays_in_range(HolidayRangeParams {
            start: "2024-12-20".into(),
            end: "2025-01-05".into(),
        })
        .unwrap();
        let names: Vec<&str> = holidays.iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Natal", "Confraternização Universal"]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(holidays_in_range(HolidayRangeParams {
            start: "2025-02-01".into(),
            end: "2025-01-01".into(),
        })
        .is_err());
    }

    #[test]
    fn absurd_year_is_rejected() {
        let params = HolidayYearParams { year: Some(20_000) };
        assert!(holidays_of_year(params, at("2025-06-01 12:00")).is_err());
    }
}
