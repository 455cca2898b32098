//! Carrier Parsers (C3): one module per feed, sharing a `CarrierParser`
//! trait instead of an inheritance hierarchy — a closed set of four
//! variants, so a trait object is never needed; the dispatcher matches on
//! `Carrier` directly and calls the concrete type.

pub mod altan;
pub mod att;
pub mod movistar;
pub mod telcel;

use crate::domain::CanonicalRecord;
use crate::sheet::RawBlock;

/// Context threaded through a carrier's `normalize` call: identifiers the
/// parser needs but that don't live in the spreadsheet itself.
pub struct ParseContext {
    pub file_id: i64,
    /// Basename of the downloaded file, used by AT&T to recover a
    /// subscriber MSISDN embedded in the filename.
    pub file_name: String,
}

pub trait CarrierParser {
    /// Header tokens this carrier's block-locator scores against.
    fn expected_tokens(&self) -> &'static [&'static str];

    /// Map, cast, derive, filter, and deduplicate one detected block into
    /// canonical rows ready for bulk insert.
    fn normalize(&self, block: RawBlock, ctx: &ParseContext) -> Vec<CanonicalRecord>;
}

/// Case/accent-insensitive header lookup shared by every carrier's column
/// mapper. A header cell matches an alias when the normalized cell text
/// *starts with* the alias (not exact equality) so that a cell carrying
/// extra text around the token, e.g. `"NÚMERO A (MSISDN)"`, still maps.
/// When more than one header cell matches, the one whose matching alias is
/// longest wins — the longest-prefix rule that lets a carrier tell
/// `"numero a imei"` apart from the shorter, more generic `"numero a"`.
pub fn header_index(header: &[String], aliases: &[&str]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, cell) in header.iter().enumerate() {
        let normalized = crate::sheet::norm(cell);
        let longest_alias = aliases
            .iter()
            .filter(|a| normalized.starts_with(**a))
            .map(|a| a.len())
            .max();
        if let Some(alias_len) = longest_alias {
            match best {
                Some((_, best_len)) if best_len >= alias_len => {}
                _ => best = Some((idx, alias_len)),
            }
        }
    }
    best.map(|(idx, _)| idx)
}

pub fn cell<'a>(row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    let idx = idx?;
    row.get(idx).map(|s| s.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_header_with_extra_trailing_text() {
        let h = row(&["NÚMERO A (MSISDN)", "IMEI A", "FECHA"]);
        assert_eq!(header_index(&h, &["numero a"]), Some(0));
        assert_eq!(header_index(&h, &["imei"]), Some(1));
    }

    #[test]
    fn longest_alias_wins_on_collision() {
        let h = row(&["numero a imei", "numero a"]);
        assert_eq!(header_index(&h, &["numero a", "numero a imei"]), Some(0));
    }

    #[test]
    fn no_match_returns_none() {
        let h = row(&["fecha", "hora"]);
        assert_eq!(header_index(&h, &["imei"]), None);
    }
}
