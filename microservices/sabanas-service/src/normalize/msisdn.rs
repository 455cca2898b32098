//! MSISDN (phone number) normalization.
//!
//! Ported from the non-numeric-token rejection and `52`-prefix stripping
//! rules scattered across the Telcel/AT&T/Movistar parsers in the original
//! service.

const REJECTED_TOKENS: &[&str] = &["ims", "internet.itelcel.com"];

fn is_all_zeros(digits: &str) -> bool {
    !digits.is_empty() && digits.chars().all(|c| c == '0')
}

fn is_rejected_text(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return true;
    }
    if lower.starts_with("telcel") {
        return true;
    }
    REJECTED_TOKENS.contains(&lower.as_str())
}

/// Strip the `52` country-code prefix repeatedly while the number stays
/// longer than 10 digits (the carrier files store 10-digit local MSISDNs).
fn strip_country_code(mut digits: String) -> String {
    while digits.len() > 10 && digits.starts_with("52") {
        digits = digits[2..].to_string();
    }
    digits
}

/// Clean a raw MSISDN cell. Returns `None` for empty, all-zero, or known
/// non-numeric placeholder text.
pub fn clean_msisdn(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if is_rejected_text(raw) {
        return None;
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || is_all_zeros(&digits) {
        return None;
    }
    Some(strip_country_code(digits))
}

/// Pull the subscriber MSISDN embedded in a downloaded filename: the
/// longest run of at least 8 digits, with the same `52`-prefix stripping
/// applied to cell values. Grounded in AT&T's `_extract_msisdn_from_filename`.
pub fn extract_msisdn_from_filename(filename: &str) -> Option<String> {
    let mut best: Option<String> = None;
    let mut current = String::new();

    let mut flush = |current: &mut String, best: &mut Option<String>| {
        if current.len() >= 8 {
            if best.as_ref().map(|b| current.len() > b.len()).unwrap_or(true) {
                *best = Some(current.clone());
            }
        }
        current.clear();
    };

    for c in filename.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else {
            flush(&mut current, &mut best);
        }
    }
    flush(&mut current, &mut best);

    best.map(strip_country_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation() {
        assert_eq!(clean_msisdn(Some("55-1234-5678")), Some("5512345678".to_string()));
    }

    #[test]
    fn rejects_all_zeros() {
        assert_eq!(clean_msisdn(Some("0000000000")), None);
    }

    #[test]
    fn rejects_known_non_numeric_tokens() {
        assert_eq!(clean_msisdn(Some("ims")), None);
        assert_eq!(clean_msisdn(Some("internet.itelcel.com")), None);
        assert_eq!(clean_msisdn(Some("telcel-data")), None);
    }

    #[test]
    fn strips_leading_52_while_over_ten_digits() {
        assert_eq!(clean_msisdn(Some("525512345678")), Some("5512345678".to_string()));
        // Stays at exactly 10 digits, no further stripping possible.
        assert_eq!(clean_msisdn(Some("5212345678")), Some("5212345678".to_string()));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(clean_msisdn(Some("")), None);
        assert_eq!(clean_msisdn(None), None);
    }

    #[test]
    fn extracts_longest_digit_run_from_filename() {
        assert_eq!(
            extract_msisdn_from_filename("ATT_525512345678_20240315.xlsx"),
            Some("5512345678".to_string())
        );
    }

    #[test]
    fn filename_with_no_digit_run_is_none() {
        assert_eq!(extract_msisdn_from_filename("report.xlsx"), None);
    }
}
