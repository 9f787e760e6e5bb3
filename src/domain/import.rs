//! Shared shapes and helpers for spreadsheet import and export.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// UTF-8 byte order mark written at the start of exported CSV files so that
/// spreadsheet tools detect the encoding.
pub const UTF8_BOM: &str = "\u{feff}";

/// A row that could not be imported.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ImportError {
    /// Spreadsheet line number, counting the header as line 1.
    pub line: usize,
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ImportSummary {
    pub total: usize,
    pub success: usize,
    pub errors: Vec<ImportError>,
}

impl ImportSummary {
    pub fn record_success(&mut self) {
        self.total += 1;
        self.success += 1;
    }

    /// `index` is the zero-based data row index.
    pub fn record_error(
        &mut self,
        index: usize,
        name: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.total += 1;
        self.errors.push(ImportError {
            line: index + 2,
            name: name.into(),
            error: error.into(),
        });
    }
}

/// Parses `dd/mm/yyyy` or `yyyy-mm-dd`.
pub fn parse_br_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_br_datetime(value: NaiveDateTime) -> String {
    value.format("%d/%m/%Y").to_string()
}

/// Strips a leading byte order mark from uploaded text.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix(UTF8_BOM).unwrap_or(content)
}

/// Formats centavos as a decimal with a comma separator, e.g. `1234,50`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02}", abs / 100, abs % 100)
}

/// Parses `1234,56`, `1.234,56` or `1234.56` into centavos.
pub fn parse_cents(value: &str) -> Option<i64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches("R$")
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    let amount: f64 = normalized.parse().ok()?;
    if amount.is_finite() {
        Some((amount * 100.0).round() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(1990, 4, 21);
        assert_eq!(parse_br_date("21/04/1990"), expected);
        assert_eq!(parse_br_date("1990-04-21"), expected);
        assert_eq!(parse_br_date("04/21/1990"), None);
    }

    #[test]
    fn error_lines_account_for_header() {
        let mut summary = ImportSummary::default();
        summary.record_success();
        summary.record_error(1, "Fulano", "Nome é obrigatório");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.errors[0].line, 3);
    }

    #[test]
    fn money_round_trips_brazilian_notation() {
        assert_eq!(parse_cents("1.234,56"), Some(123_456));
        assert_eq!(parse_cents("R$ 10,5"), Some(1_050));
        assert_eq!(parse_cents("99.90"), Some(9_990));
        assert_eq!(parse_cents("abc"), None);
        assert_eq!(format_cents(123_456), "1234,56");
        assert_eq!(format_cents(-5), "-0,05");
    }

    #[test]
    fn bom_is_removed() {
        assert_eq!(strip_bom("\u{feff}Nome"), "Nome");
        assert_eq!(strip_bom("Nome"), "Nome");
    }
}
