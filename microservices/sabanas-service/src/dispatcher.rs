//! Provider Dispatcher (C4): decide which carrier parser owns a file.
//!
//! Selection order, first decisive rule wins — grounded in spec §4.5 and the
//! carrier-id table implicit in the original's `compania`/`id_compania_telefonica`
//! columns.

use crate::domain::Carrier;

fn carrier_id_lookup(id: i64) -> Option<Carrier> {
    match id {
        1 | 2 | 3 | 14 => Some(Carrier::Telcel),
        4 | 13 => Some(Carrier::Att),
        5 => Some(Carrier::Movistar),
        12 => Some(Carrier::Altan),
        _ => None,
    }
}

fn token_match(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn carrier_from_text(text: &str) -> Option<Carrier> {
    if token_match(text, &["altan", "altán"]) {
        Some(Carrier::Altan)
    } else if token_match(text, &["movistar", "telefonica", "telefónica"]) {
        Some(Carrier::Movistar)
    } else if token_match(text, &["telcel"]) {
        Some(Carrier::Telcel)
    } else if token_match(text, &["at&t", "att"]) {
        Some(Carrier::Att)
    } else {
        None
    }
}

/// Resolve the carrier owning a file. `carrier_id`/`carrier_name` come from
/// `sabanas.archivos`; `file_path` is the downloaded local path. Falls back
/// to Telcel when nothing decisive matches (spec §4.5 rule 4).
pub fn dispatch(carrier_id: Option<i64>, carrier_name: Option<&str>, file_path: &str) -> Carrier {
    if let Some(id) = carrier_id {
        if let Some(carrier) = carrier_id_lookup(id) {
            return carrier;
        }
    }

    if let Some(name) = carrier_name {
        if let Some(carrier) = carrier_from_text(name) {
            return carrier;
        }
    }

    if let Some(carrier) = carrier_from_text(file_path) {
        return carrier;
    }

    Carrier::Telcel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_id_table_wins_first() {
        assert_eq!(dispatch(Some(5), Some("whatever"), "whatever.xlsx"), Carrier::Movistar);
    }

    #[test]
    fn falls_back_to_name_token_match() {
        assert_eq!(dispatch(None, Some("ALTÁN telecom"), "file.xlsx"), Carrier::Altan);
    }

    #[test]
    fn falls_back_to_filename_token_match() {
        assert_eq!(dispatch(None, None, "/tmp/ATT_export.xlsx"), Carrier::Att);
    }

    #[test]
    fn defaults_to_telcel() {
        assert_eq!(dispatch(None, None, "unknown.xlsx"), Carrier::Telcel);
    }
}
