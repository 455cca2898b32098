//! Movistar CDR normalization (spec §4.4.2), ported from
//! `original_source/app/services/movistar.py`.

use std::collections::HashMap;

use crate::carriers::{cell, header_index, CarrierParser, ParseContext};
use crate::domain::{CanonicalRecord, RecordType};
use crate::normalize::{
    clean_imei, clean_msisdn, parse_coordinate, parse_duration_seconds, parse_movistar_datetime,
};
use crate::sheet::RawBlock;

pub struct MovistarParser;

const TOKENS: &[&str] = &[
    "tipo cdr",
    "numero a",
    "numero b",
    "tipo evento",
    "fecha evento",
    "hora evento",
    "duracion",
    "imei",
    "imsi",
    "codbts",
    "latitud",
    "longitud",
];

fn map_tipo_registro(tipo_cdr: &str, tipo_evento: &str) -> RecordType {
    let cdr = tipo_cdr.trim().to_uppercase();
    let evt = tipo_evento.trim().to_uppercase();
    match (cdr.as_str(), evt.as_str()) {
        ("GSM", "ENTRANTE") => RecordType::VozEntrante,
        ("GSM", "SALIENTE") => RecordType::VozSaliente,
        ("SMS", "ENTRANTE") => RecordType::Mensaje2ViasEnt,
        ("SMS", "SALIENTE") => RecordType::Mensaje2ViasSal,
        _ => RecordType::Ninguno,
    }
}

impl CarrierParser for MovistarParser {
    fn expected_tokens(&self) -> &'static [&'static str] {
        TOKENS
    }

    fn normalize(&self, block: RawBlock, ctx: &ParseContext) -> Vec<CanonicalRecord> {
        let h = &block.header;
        let idx_a = header_index(h, &["numero a"]);
        let idx_b = header_index(h, &["numero b"]);
        let idx_cdr = header_index(h, &["tipo cdr"]);
        let idx_evt = header_index(h, &["tipo evento"]);
        let idx_fecha = header_index(h, &["fecha evento"]);
        let idx_hora = header_index(h, &["hora evento"]);
        let idx_dur = header_index(h, &["duracion"]);
        let idx_imei = header_index(h, &["imei"]);
        let idx_lat = header_index(h, &["latitud"]);
        let idx_lon = header_index(h, &["longitud"]);

        let mut candidates = Vec::new();

        for row in &block.rows {
            let Some(number_a) = clean_msisdn(cell(row, idx_a)) else { continue };

            let fecha = cell(row, idx_fecha).unwrap_or("");
            let hora = cell(row, idx_hora).unwrap_or("");
            let Some(event_at) = parse_movistar_datetime(fecha, hora) else { continue };

            let tipo_cdr = cell(row, idx_cdr).unwrap_or("");
            let tipo_evento = cell(row, idx_evt).unwrap_or("");
            let is_gsm = tipo_cdr.trim().eq_ignore_ascii_case("gsm");

            let imei = clean_imei(cell(row, idx_imei));
            if is_gsm && imei.is_none() {
                continue;
            }

            let record_type = map_tipo_registro(tipo_cdr, tipo_evento);
            let duration_sec = cell(row, idx_dur).and_then(parse_duration_seconds).unwrap_or(0);
            let number_b = cell(row, idx_b).and_then(|s| clean_msisdn(Some(s)));
            let lat_raw = cell(row, idx_lat).map(str::to_string);
            let lon_raw = cell(row, idx_lon).map(str::to_string);
            let lat_dec = cell(row, idx_lat).and_then(|s| parse_coordinate(Some(s)));
            let lon_dec = cell(row, idx_lon).and_then(|s| parse_coordinate(Some(s)));

            // Unlike the other carriers, Movistar's filter doesn't require
            // coordinates, so both branches of the source formula are
            // reachable: `false` only when both are absent, `None` otherwise.
            let target_coordinate = if lat_dec.is_none() && lon_dec.is_none() { Some(false) } else { None };

            candidates.push(CanonicalRecord {
                file_id: ctx.file_id,
                number_a,
                number_b,
                record_type,
                event_at,
                duration_sec,
                latitude_raw: lat_raw,
                longitude_raw: lon_raw,
                azimuth: Some(360.0),
                latitude_dec: lat_dec,
                longitude_dec: lon_dec,
                altitude: 0.0,
                target_coordinate,
                imei,
                phone: None,
            });
        }

        let mut deduped = two_pass_dedup(candidates);
        deduped.sort_by(|a, b| {
            (a.event_at, &a.number_a, a.number_b.clone()).cmp(&(
                b.event_at,
                &b.number_a,
                b.number_b.clone(),
            ))
        });
        deduped
    }
}

/// Rows carrying both decimal coordinates dedup against coordinates; rows
/// missing either coordinate dedup against `(numberA, numberB, eventAt,
/// recordType)` instead, matching `movistar.py`'s two-pass grouping.
fn two_pass_dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut with_coords: HashMap<(String, i64, String, String), CanonicalRecord> = HashMap::new();
    let mut without_coords: HashMap<(String, String, i64, i32), CanonicalRecord> = HashMap::new();

    for rec in records {
        if let (Some(lat), Some(lon)) = (rec.latitude_dec, rec.longitude_dec) {
            let key = (rec.number_a.clone(), rec.event_at.timestamp(), lat.to_bits().to_string(), lon.to_bits().to_string());
            match with_coords.get(&key) {
                Some(existing) if existing.duration_sec >= rec.duration_sec => {}
                _ => {
                    with_coords.insert(key, rec);
                }
            }
        } else {
            let key = (
                rec.number_a.clone(),
                rec.number_b.clone().unwrap_or_default(),
                rec.event_at.timestamp(),
                rec.record_type.as_i32(),
            );
            match without_coords.get(&key) {
                Some(existing) if existing.duration_sec >= rec.duration_sec => {}
                _ => {
                    without_coords.insert(key, rec);
                }
            }
        }
    }

    with_coords.into_values().chain(without_coords.into_values()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext {
        ParseContext { file_id: 1, file_name: "movistar.xlsx".to_string() }
    }

    fn header() -> Vec<String> {
        vec![
            "numero a",
            "numero b",
            "tipo cdr",
            "tipo evento",
            "fecha evento",
            "hora evento",
            "duracion",
            "imei",
            "latitud",
            "longitud",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn gsm_requires_imei() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![vec![
                "5512345678".into(),
                "5587654321".into(),
                "GSM".into(),
                "ENTRANTE".into(),
                "20240315".into(),
                "103000".into(),
                "90".into(),
                "".into(),
                "19.4326".into(),
                "-99.1332".into(),
            ]],
        };

        let out = MovistarParser.normalize(block, &ctx());
        assert!(out.is_empty());
    }

    #[test]
    fn maps_gsm_entrante_to_voz_entrante() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![vec![
                "5512345678".into(),
                "5587654321".into(),
                "GSM".into(),
                "ENTRANTE".into(),
                "20240315".into(),
                "103000".into(),
                "90".into(),
                "352099001761481".into(),
                "19.4326".into(),
                "-99.1332".into(),
            ]],
        };

        let out = MovistarParser.normalize(block, &ctx());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record_type, RecordType::VozEntrante);
        assert_eq!(out[0].azimuth, Some(360.0));
        assert_eq!(out[0].target_coordinate, None);
    }

    #[test]
    fn missing_coordinates_set_target_coordinate_false() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![vec![
                "5512345678".into(),
                "5587654321".into(),
                "GSM".into(),
                "ENTRANTE".into(),
                "20240315".into(),
                "103000".into(),
                "90".into(),
                "352099001761481".into(),
                "".into(),
                "".into(),
            ]],
        };

        let out = MovistarParser.normalize(block, &ctx());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target_coordinate, Some(false));
    }
}
