//! IMEI normalization: keep digits only, truncate to the 15-digit TAC+SNR+CD
//! form used by all four carrier feeds.

pub fn clean_imei(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(if digits.len() > 15 { digits[..15].to_string() } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_fifteen_digits() {
        assert_eq!(clean_imei(Some("123456789012345999")), Some("123456789012345".to_string()));
    }

    #[test]
    fn strips_separators() {
        assert_eq!(clean_imei(Some("35-209900-176148-1")), Some("352099001761481".to_string()));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(clean_imei(Some("")), None);
        assert_eq!(clean_imei(None), None);
    }
}
