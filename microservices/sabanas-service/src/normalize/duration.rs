//! Call-duration normalization to whole seconds.
//!
//! Grounded in `_parse_duration_to_seconds` from the Movistar parser: accepts
//! `mm:ss`, `hh:mm:ss`, a plain integer, or a float (fractional seconds
//! truncated).

pub fn parse_duration_seconds(raw: Option<&str>) -> Option<i32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.contains(':') {
        let parts: Vec<&str> = raw.split(':').collect();
        let nums: Option<Vec<i64>> = parts.iter().map(|p| p.trim().parse::<i64>().ok()).collect();
        let nums = nums?;
        let total = match nums.len() {
            2 => nums[0] * 60 + nums[1],
            3 => nums[0] * 3600 + nums[1] * 60 + nums[2],
            _ => return None,
        };
        return Some(total as i32);
    }

    if let Ok(i) = raw.parse::<i64>() {
        return Some(i as i32);
    }

    raw.parse::<f64>().ok().map(|f| f as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mm_ss() {
        assert_eq!(parse_duration_seconds(Some("02:30")), Some(150));
    }

    #[test]
    fn parses_hh_mm_ss() {
        assert_eq!(parse_duration_seconds(Some("01:02:30")), Some(3750));
    }

    #[test]
    fn parses_plain_int() {
        assert_eq!(parse_duration_seconds(Some("45")), Some(45));
    }

    #[test]
    fn parses_float_fallback() {
        assert_eq!(parse_duration_seconds(Some("45.9")), Some(45));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(parse_duration_seconds(Some("")), None);
        assert_eq!(parse_duration_seconds(None), None);
    }
}
