//! Carrier-specific date/time parsing.
//!
//! Each carrier feed writes timestamps in its own handful of formats, with
//! Excel occasionally serializing a cell as an ISO string instead of text.
//! Grounded in the `_FORMATOS_DATETIME` lists and `_parse_fecha_hora`
//! functions of the Telcel, Movistar, and AT&T parsers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Formats tried, in order, for the Telcel and AT&T single-cell timestamp.
/// Only 4-digit-year forms live here: a 2-digit year is expanded to 4 digits
/// by [`expand_two_digit_year`] before a string ever reaches this list,
/// since chrono's own `%y` pivot doesn't match the one these feeds need.
pub const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

static TWO_DIGIT_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}[/-]\d{1,2}[/-])(\d{2})(\D.*)?$").unwrap());

static ANOMALOUS_EXCEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+00:00:00\s+(\d{1,2}:\d{2}(?::\d{2})?)$").unwrap()
});

const SPANISH_MONTHS_FULL: &[(&str, &str)] = &[
    ("enero", "01"),
    ("febrero", "02"),
    ("marzo", "03"),
    ("abril", "04"),
    ("mayo", "05"),
    ("junio", "06"),
    ("julio", "07"),
    ("agosto", "08"),
    ("septiembre", "09"),
    ("setiembre", "09"),
    ("octubre", "10"),
    ("noviembre", "11"),
    ("diciembre", "12"),
];

const SPANISH_MONTHS_ABBR: &[(&str, &str)] = &[
    ("ene", "01"),
    ("feb", "02"),
    ("mar", "03"),
    ("abr", "04"),
    ("may", "05"),
    ("jun", "06"),
    ("jul", "07"),
    ("ago", "08"),
    ("sep", "09"),
    ("oct", "10"),
    ("nov", "11"),
    ("dic", "12"),
];

/// Try every format in order, returning the first successful parse as UTC.
pub fn parse_with_formats(raw: &str, formats: &[&str]) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
        if let Ok(nd) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&nd.and_hms_opt(0, 0, 0).unwrap()));
        }
    }
    None
}

/// Normalize a single-digit hour prefix (`9:30:00` -> `09:30:00`) the way
/// the AT&T parser zero-pads before matching against its format list.
pub fn zero_pad_hour(raw: &str) -> String {
    let raw = raw.trim();
    if let Some((hour, rest)) = raw.split_once(':') {
        if hour.len() == 1 && hour.chars().all(|c| c.is_ascii_digit()) {
            return format!("0{hour}:{rest}");
        }
    }
    raw.to_string()
}

/// Expand a 2-digit year in a `dd/mm/yy` or `dd-mm-yy` date (with an
/// optional trailing time) to 4 digits, using the pivot `<=50 -> 20yy,
/// else -> 19yy`. A 4-digit year never matches this pattern, so dates that
/// already carry one pass through unchanged.
pub fn expand_two_digit_year(raw: &str) -> String {
    let raw = raw.trim();
    match TWO_DIGIT_YEAR_RE.captures(raw) {
        Some(caps) => {
            let prefix = caps.get(1).unwrap().as_str();
            let yy: u32 = caps.get(2).unwrap().as_str().parse().unwrap_or(0);
            let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            let year = if yy <= 50 { 2000 + yy } else { 1900 + yy };
            format!("{prefix}{year}{rest}")
        }
        None => raw.to_string(),
    }
}

/// Replace a Spanish month name or 3-letter abbreviation with its numeral.
/// Full names go first so `"marzo"` isn't clipped by the `"mar"`
/// abbreviation before it's matched whole.
pub fn normalize_spanish_months(raw: &str) -> String {
    let mut out = raw.to_lowercase();
    for (name, num) in SPANISH_MONTHS_FULL {
        out = out.replace(name, num);
    }
    for (abbr, num) in SPANISH_MONTHS_ABBR {
        out = out.replace(abbr, num);
    }
    out
}

/// Collapse Telcel's anomalous Excel export shape, `YYYY-MM-DD 00:00:00
/// HH:MM:SS` — a midnight-stamped date glued to the real time-of-day in the
/// same cell — to the ordinary `YYYY-MM-DD HH:MM:SS` form.
pub fn resolve_excel_midnight_override(raw: &str) -> String {
    let raw = raw.trim();
    match ANOMALOUS_EXCEL_RE.captures(raw) {
        Some(caps) => {
            let date = caps.get(1).unwrap().as_str();
            let time = caps.get(2).unwrap().as_str();
            format!("{date} {time}")
        }
        None => raw.to_string(),
    }
}

/// Telcel's `fecha`/`hora` pair, combined and run through the Spanish-month,
/// anomalous-Excel-form, and 2-digit-year normalizations before the generic
/// format list is tried.
pub fn parse_telcel_datetime(fecha: &str, hora: &str) -> Option<DateTime<Utc>> {
    let fecha = normalize_spanish_months(fecha.trim());
    let hora = hora.trim();

    let combined = if hora.is_empty() { fecha.clone() } else { format!("{fecha} {hora}") };
    let combined = expand_two_digit_year(&resolve_excel_midnight_override(&combined));
    if let Some(dt) = parse_with_formats(&combined, GENERIC_DATETIME_FORMATS) {
        return Some(dt);
    }

    let fecha_only = expand_two_digit_year(&resolve_excel_midnight_override(&fecha));
    parse_with_formats(&fecha_only, GENERIC_DATETIME_FORMATS)
}

/// Movistar's primary encoding: a `yyyymmdd` date cell and a zero-padded
/// `hhmmss` (or `hmmss`) time cell, combined into one timestamp. Falls back
/// to `GENERIC_DATETIME_FORMATS` against a space-joined `"{fecha} {hora}"`
/// string when the primary shape doesn't match.
pub fn parse_movistar_datetime(fecha: &str, hora: &str) -> Option<DateTime<Utc>> {
    let fecha = fecha.trim();
    let hora_digits: String = hora.trim().chars().filter(|c| c.is_ascii_digit()).collect();

    if fecha.len() == 8 && fecha.chars().all(|c| c.is_ascii_digit()) {
        let padded_hora = format!("{:0>6}", hora_digits);
        if padded_hora.len() == 6 {
            let combined = format!("{fecha}{padded_hora}");
            if let Ok(ndt) = NaiveDateTime::parse_from_str(&combined, "%Y%m%d%H%M%S") {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    let combined = format!("{fecha} {hora}");
    parse_with_formats(&combined, GENERIC_DATETIME_FORMATS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_date_with_time() {
        let dt = parse_with_formats("15/03/2024 10:30:00", GENERIC_DATETIME_FORMATS).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn parses_iso_date_only() {
        let dt = parse_with_formats("2024-03-15", GENERIC_DATETIME_FORMATS).unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-03-15");
    }

    #[test]
    fn zero_pads_single_digit_hour() {
        assert_eq!(zero_pad_hour("9:05:00"), "09:05:00");
        assert_eq!(zero_pad_hour("19:05:00"), "19:05:00");
    }

    #[test]
    fn expands_low_two_digit_year_to_2000s() {
        assert_eq!(expand_two_digit_year("04-06-25 0:16:06"), "04-06-2025 0:16:06");
        assert_eq!(expand_two_digit_year("15/03/24"), "15/03/2024");
    }

    #[test]
    fn expands_high_two_digit_year_to_1900s() {
        assert_eq!(expand_two_digit_year("04-06-87 10:00:00"), "04-06-1987 10:00:00");
    }

    #[test]
    fn leaves_four_digit_year_untouched() {
        assert_eq!(expand_two_digit_year("04-06-2025 0:16:06"), "04-06-2025 0:16:06");
    }

    #[test]
    fn att_documented_example_parses_to_2025() {
        let combined = expand_two_digit_year("04-06-25 00:16:06");
        let dt = parse_with_formats(&combined, GENERIC_DATETIME_FORMATS).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-06-04 00:16:06");
    }

    #[test]
    fn normalizes_spanish_month_names() {
        assert_eq!(normalize_spanish_months("15-marzo-2024"), "15-03-2024");
        assert_eq!(normalize_spanish_months("15-Ene-2024"), "15-01-2024");
    }

    #[test]
    fn resolves_excel_midnight_override() {
        assert_eq!(
            resolve_excel_midnight_override("2024-03-15 00:00:00 10:30:00"),
            "2024-03-15 10:30:00"
        );
        assert_eq!(resolve_excel_midnight_override("2024-03-15 10:30:00"), "2024-03-15 10:30:00");
    }

    #[test]
    fn telcel_parses_spanish_month_date() {
        let dt = parse_telcel_datetime("15-marzo-2024", "10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn telcel_parses_two_digit_year() {
        let dt = parse_telcel_datetime("15/03/24", "10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-03-15");
    }

    #[test]
    fn telcel_parses_anomalous_excel_form() {
        let dt = parse_telcel_datetime("2024-03-15 00:00:00 10:30:00", "").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn movistar_primary_shape() {
        let dt = parse_movistar_datetime("20240315", "103000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn movistar_short_time_is_padded() {
        let dt = parse_movistar_datetime("20240315", "930").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "00:09:30");
    }

    #[test]
    fn movistar_falls_back_to_generic() {
        let dt = parse_movistar_datetime("15/03/2024", "10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 10:30:00");
    }
}
