//! Brazilian national holidays computed from the calendar.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HolidayKind {
    National,
    Facultativo,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: HolidayKind,
}

const FIXED: [(u32, u32, &str); 9] = [
    (1, 1, "Confraternização Universal"),
    (4, 21, "Tiradentes"),
    (5, 1, "Dia do Trabalho"),
    (9, 7, "Independência do Brasil"),
    (10, 12, "Nossa Senhora Aparecida"),
    (11, 2, "Finados"),
    (11, 15, "Proclamação da República"),
    (11, 20, "Dia Nacional de Zumbi e da Consciência Negra"),
    (12, 25, "Natal"),
];

/// Easter Sunday in the Gregorian calendar (anonymous algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// All holidays of `year`, sorted by date.
pub fn holidays_for_year(year: i32) -> Vec<Holiday> {
    let mut holidays: Vec<Holiday> = FIXED
        .iter()
        .filter_map(|(month, day, name)| {
            NaiveDate::from_ymd_opt(year, *month, *day).map(|date| Holiday {
                date,
                name,
                kind: HolidayKind::National,
            })
        })
        .collect();

    if let Some(easter) = easter_sunday(year) {
        let movable = [
            (-48, "Carnaval", HolidayKind::Facultativo),
            (-47, "Carnaval", HolidayKind::Facultativo),
            (-2, "Sexta-feira Santa", HolidayKind::National),
            (0, "Páscoa", HolidayKind::National),
            (60, "Corpus Christi", HolidayKind::Facultativo),
        ];
        holidays.extend(movable.into_iter().map(|(offset, name, kind)| Holiday {
            date: easter + Duration::days(offset),
            name,
            kind,
        }));
    }

    holidays.sort_by_key(|holiday| holiday.date);
    holidays
}

/// Holidays falling inside `[start, end]`, across year boundaries.
pub fn holidays_between(start: NaiveDate, end: NaiveDate) -> Vec<Holiday> {
    if end < start {
        return Vec::new();
    }
    (start.year()..=end.year())
        .flat_map(holidays_for_year)
        .filter(|holiday| holiday.date >= start && holiday.date <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(date(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(date(2026, 4, 5)));
    }

    #[test]
    fn year_has_all_holidays() {
        let holidays = holidays_for_year(2025);
        assert_eq!(holidays.len(), 14);
        assert_eq!(holidays[0].date, date(2025, 1, 1));
        assert!(holidays
            .iter()
            .any(|h| h.name == "Corpus Christi" && h.date == date(2025, 6, 19)));
        assert!(holidays
            .iter()
            .any(|h| h.name == "Carnaval" && h.date == date(2025, 3, 4)));
    }

    #[test]
    fn range_crosses_years() {
        let holidays = holidays_between(date(2024, 12, 20), date(2025, 1, 5));
        let dates: Vec<NaiveDate> = holidays.iter().map(|h| h.date).collect();
        assert_eq!(dates, vec![date(2024, 12, 25), date(2025, 1, 1)]);
        assert!(holidays_between(date(2025, 2, 1), date(2025, 1, 1)).is_empty());
    }
}
