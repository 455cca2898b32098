//! Header detection and multi-block splitting (C2).
//!
//! A single worksheet can hold more than one table, each with its own header
//! row (a common shape in the Movistar feed, which stacks a new block every
//! time the report resets). Grounded in `_score_header_row` and
//! `_find_table_in_sheet` (Telcel/AT&T, single block) and `_find_header_rows`
//! (Movistar, every header row in the sheet).

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use crate::sheet::reader::RawSheet;

/// How far into a sheet we'll scan looking for a header row before giving up.
const MAX_HEADER_SCAN_ROWS: usize = 600;
/// Minimum token-match score to accept a row as a header.
const HEADER_SCORE_THRESHOLD: usize = 5;
/// Score at which we stop scanning early — a near-complete token match.
const HEADER_SCORE_EARLY_BREAK: usize = 6;

/// One detected table: its header row and the data rows that follow it, up
/// to (but not including) the next header row or the end of the sheet.
pub struct RawBlock {
    pub sheet_name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Case-fold and strip accents so header matching is robust to the feed's
/// inconsistent capitalization and encoding quirks. Also folds `.` and `_`
/// to a space and collapses whitespace runs, matching `_norm` so that a
/// header like `"Durac. Seg."` lines up with a token like `"durac seg"`.
pub fn norm(s: &str) -> String {
    let stripped: String = s
        .nfkd()
        .filter(|c| !matches!(c, '\u{0300}'..='\u{036f}'))
        .collect::<String>()
        .trim()
        .to_lowercase()
        .replace('.', " ")
        .replace('_', " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count how many expected tokens appear as a substring of any normalized,
/// non-empty cell in `row` — one hit per token, not per cell.
pub fn score_header_row(tokens: &HashSet<&str>, row: &[String]) -> usize {
    let normalized_cells: Vec<String> = row
        .iter()
        .filter(|cell| !cell.trim().is_empty())
        .map(|cell| norm(cell))
        .collect();
    tokens
        .iter()
        .filter(|token| normalized_cells.iter().any(|cell| cell.contains(*token)))
        .count()
}

/// Scan the first `MAX_HEADER_SCAN_ROWS` of a sheet for the single header
/// row with the highest score, returning its index once it clears
/// `HEADER_SCORE_THRESHOLD`. Used by the single-block carriers (Telcel,
/// AT&T, Altán).
pub fn find_table_in_sheet(tokens: &HashSet<&str>, rows: &[Vec<String>]) -> Option<usize> {
    let scan_end = rows.len().min(MAX_HEADER_SCAN_ROWS);
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in rows.iter().enumerate().take(scan_end) {
        let score = score_header_row(tokens, row);
        if score >= HEADER_SCORE_THRESHOLD {
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((idx, score)),
            }
            if score >= HEADER_SCORE_EARLY_BREAK {
                break;
            }
        }
    }

    best.map(|(idx, _)| idx)
}

/// Scan the whole sheet and return the index of every row that scores above
/// `HEADER_SCORE_THRESHOLD`, for carriers whose feed stacks multiple blocks
/// in one sheet (Movistar).
pub fn find_header_rows(tokens: &HashSet<&str>, rows: &[Vec<String>]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter_map(|(idx, row)| (score_header_row(tokens, row) >= HEADER_SCORE_THRESHOLD).then_some(idx))
        .collect()
}

/// Split `rows` into one `RawBlock` per header row in `header_rows`. Each
/// block runs from just after its header to just before the next header (or
/// the end of the sheet). A header row repeated verbatim inside a block's
/// data region (the original's "header-repeat-row removal") is dropped.
pub fn split_blocks(sheet_name: &str, rows: &[Vec<String>], header_rows: &[usize]) -> Vec<RawBlock> {
    let mut blocks = Vec::with_capacity(header_rows.len());

    for (i, &header_idx) in header_rows.iter().enumerate() {
        let header = rows[header_idx].clone();
        let data_end = header_rows.get(i + 1).copied().unwrap_or(rows.len());
        let data_start = header_idx + 1;
        if data_start >= data_end {
            continue;
        }

        let data_rows: Vec<Vec<String>> = rows[data_start..data_end]
            .iter()
            .filter(|row| *row != &header)
            .cloned()
            .collect();

        blocks.push(RawBlock { sheet_name: sheet_name.to_string(), header, rows: data_rows });
    }

    blocks
}

/// Convenience: find and split the single block of a sheet that uses
/// `find_table_in_sheet` semantics (one header per sheet).
pub fn single_block(tokens: &HashSet<&str>, sheet: &RawSheet) -> Option<RawBlock> {
    let header_idx = find_table_in_sheet(tokens, &sheet.rows)?;
    split_blocks(&sheet.name, &sheet.rows, &[header_idx]).into_iter().next()
}

/// Convenience: find and split every block of a sheet that stacks multiple
/// header rows (Movistar semantics).
pub fn multi_block(tokens: &HashSet<&str>, sheet: &RawSheet) -> Vec<RawBlock> {
    let header_rows = find_header_rows(tokens, &sheet.rows);
    split_blocks(&sheet.name, &sheet.rows, &header_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> HashSet<&'static str> {
        ["numero a", "numero b", "fecha", "hora", "imei"].into_iter().collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scores_normalized_matches() {
        let r = row(&["NÚMERO A", "Numero B", "Fecha", "x", "IMEI"]);
        assert_eq!(score_header_row(&tokens(), &r), 4);
    }

    #[test]
    fn finds_header_row_past_threshold() {
        let rows = vec![
            row(&["junk", "preamble"]),
            row(&["numero a", "numero b", "fecha", "hora", "imei"]),
            row(&["5512345678", "5587654321", "2024-01-01", "10:00", "123456789012345"]),
        ];
        assert_eq!(find_table_in_sheet(&tokens(), &rows), Some(1));
    }

    #[test]
    fn no_header_found_below_threshold() {
        let rows = vec![row(&["a", "b"]), row(&["1", "2"])];
        assert_eq!(find_table_in_sheet(&tokens(), &rows), None);
    }

    #[test]
    fn splits_multiple_stacked_blocks() {
        let header = row(&["numero a", "numero b", "fecha", "hora", "imei"]);
        let rows = vec![
            header.clone(),
            row(&["1", "2", "3", "4", "5"]),
            header.clone(),
            row(&["6", "7", "8", "9", "10"]),
        ];
        let header_rows = find_header_rows(&tokens(), &rows);
        assert_eq!(header_rows, vec![0, 2]);

        let blocks = split_blocks("sheet1", &rows, &header_rows);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rows.len(), 1);
        assert_eq!(blocks[1].rows.len(), 1);
    }
}
