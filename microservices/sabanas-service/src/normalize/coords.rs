//! Latitude/longitude normalization: decimal (dot or comma) and
//! degrees-minutes-seconds with a hemisphere letter.
//!
//! Grounded in the `DMS_RE`/`_dms_to_decimal` pair shared by the Telcel and
//! AT&T parsers and the `_DMS`/`_to_decimal` pair in the Movistar parser,
//! which additionally accepts `O` (Oeste) as a synonym for `W`.

use once_cell::sync::Lazy;
use regex::Regex;

static DMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(\d+)[°\s]+(\d+)['\s]+([\d.]+)["\s]*([NSEWO])?\s*$"#).unwrap()
});

fn hemisphere_sign(letter: char) -> f64 {
    match letter.to_ascii_uppercase() {
        'S' | 'W' | 'O' => -1.0,
        _ => 1.0,
    }
}

/// Parse a single coordinate cell (latitude or longitude). Accepts a plain
/// decimal number (with `,` or `.` as the separator) or a DMS string such as
/// `19°25'30.5"N`.
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(caps) = DMS_RE.captures(raw) {
        let deg: f64 = caps.get(1)?.as_str().parse().ok()?;
        let min: f64 = caps.get(2)?.as_str().parse().ok()?;
        let sec: f64 = caps.get(3)?.as_str().parse().ok()?;
        let sign = caps
            .get(4)
            .map(|m| hemisphere_sign(m.as_str().chars().next().unwrap_or('N')))
            .unwrap_or(1.0);
        return Some(sign * (deg + min / 60.0 + sec / 3600.0));
    }

    let normalized = raw.replace(',', ".");
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(parse_coordinate(Some("19.4326")), Some(19.4326));
    }

    #[test]
    fn parses_comma_decimal() {
        assert_eq!(parse_coordinate(Some("-99,1332")), Some(-99.1332));
    }

    #[test]
    fn parses_dms_with_hemisphere() {
        let v = parse_coordinate(Some("19°25'48.0\"N")).unwrap();
        assert!((v - 19.43).abs() < 0.01);
    }

    #[test]
    fn oeste_hemisphere_is_negative() {
        let v = parse_coordinate(Some("99°7'59.5\"O")).unwrap();
        assert!(v < 0.0);
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_coordinate(Some("")), None);
        assert_eq!(parse_coordinate(None), None);
    }
}
