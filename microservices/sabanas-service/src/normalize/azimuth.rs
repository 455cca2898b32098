//! Azimuth normalization.
//!
//! Some AT&T feeds encode azimuth as a bracketed list, `[a:b:c]`, when a cell
//! carries readings from more than one sector. Grounded in `_parse_azimuth`:
//! take the first element that parses as a number.

pub fn parse_azimuth(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let raw = raw.replace(',', ".");

    if raw.starts_with('[') && raw.ends_with(']') {
        let inner = &raw[1..raw.len() - 1];
        return inner.split(':').find_map(|part| part.trim().parse::<f64>().ok());
    }

    raw.parse::<f64>().ok()
}

/// From a bracketed `[a:b:c]` list, return the last non-zero element, or the
/// last element if every entry is zero. Used for list-encoded latitude and
/// longitude cells in the AT&T feed (`_pick_last_nonzero`).
pub fn pick_last_nonzero(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let inner = if trimmed.starts_with('[') && trimmed.ends_with(']') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    let parts: Vec<&str> = inner.split(':').map(str::trim).collect();
    if parts.is_empty() {
        return None;
    }
    parts
        .iter()
        .rev()
        .find(|p| p.parse::<f64>().map(|v| v != 0.0).unwrap_or(false))
        .copied()
        .or_else(|| parts.last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_number() {
        assert_eq!(parse_azimuth(Some("180.5")), Some(180.5));
    }

    #[test]
    fn parses_comma_decimal() {
        assert_eq!(parse_azimuth(Some("30,5")), Some(30.5));
    }

    #[test]
    fn takes_first_parseable_from_list() {
        assert_eq!(parse_azimuth(Some("[90:180:270]")), Some(90.0));
    }

    #[test]
    fn last_nonzero_picks_rightmost_nonzero() {
        assert_eq!(pick_last_nonzero("[0:0:19.43]"), Some("19.43"));
    }

    #[test]
    fn last_nonzero_falls_back_to_last_when_all_zero() {
        assert_eq!(pick_last_nonzero("[0:0:0]"), Some("0"));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_azimuth(Some("")), None);
        assert_eq!(parse_azimuth(None), None);
    }
}
