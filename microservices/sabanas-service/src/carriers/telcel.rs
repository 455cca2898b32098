//! Telcel CDR normalization (spec §4.4.1), ported from
//! `original_source/app/services/telcel_v1.py`.

use std::collections::HashMap;

use crate::carriers::{cell, header_index, CarrierParser, ParseContext};
use crate::domain::{CanonicalRecord, RecordType};
use crate::normalize::{
    clean_imei, clean_msisdn, parse_azimuth, parse_coordinate, parse_duration_seconds,
    parse_telcel_datetime,
};
use crate::sheet::RawBlock;

pub struct TelcelParser;

const TOKENS: &[&str] = &[
    "telefono", "tipo", "numero a", "numero b", "fecha", "hora", "durac", "imei", "latitud",
    "longitud", "azimuth",
];

fn map_tipo(raw: &str) -> RecordType {
    let t = raw.trim().to_lowercase();
    if t.starts_with("datos") {
        RecordType::Datos
    } else if t.starts_with("mensaje entrante") {
        RecordType::Mensaje2ViasEnt
    } else if t.starts_with("mensaje saliente") {
        RecordType::Mensaje2ViasSal
    } else if t.starts_with("voz entrante") {
        RecordType::VozEntrante
    } else if t.starts_with("voz saliente") {
        RecordType::VozSaliente
    } else if t.starts_with("voz transfer") {
        RecordType::VozTransfer
    } else if t.starts_with("voz transito") || t.starts_with("voz tránsito") {
        RecordType::VozTransito
    } else {
        RecordType::Ninguno
    }
}

impl CarrierParser for TelcelParser {
    fn expected_tokens(&self) -> &'static [&'static str] {
        TOKENS
    }

    fn normalize(&self, block: RawBlock, ctx: &ParseContext) -> Vec<CanonicalRecord> {
        let h = &block.header;
        let idx_a = header_index(h, &["numero a", "telefono"]);
        let idx_b = header_index(h, &["numero b"]);
        let idx_tipo = header_index(h, &["tipo"]);
        let idx_fecha = header_index(h, &["fecha"]);
        let idx_hora = header_index(h, &["hora"]);
        let idx_dur = header_index(h, &["durac", "duracion"]);
        let idx_imei = header_index(h, &["imei"]);
        let idx_lat = header_index(h, &["latitud"]);
        let idx_lon = header_index(h, &["longitud"]);
        let idx_az = header_index(h, &["azimuth"]);

        let mut candidates = Vec::new();

        for row in &block.rows {
            let Some(number_a) = clean_msisdn(cell(row, idx_a)) else { continue };

            let fecha = cell(row, idx_fecha).unwrap_or("");
            let hora = cell(row, idx_hora).unwrap_or("");
            let Some(event_at) = parse_telcel_datetime(fecha, hora) else { continue };

            let imei = clean_imei(cell(row, idx_imei));
            let lat_raw = cell(row, idx_lat).map(str::to_string);
            let lon_raw = cell(row, idx_lon).map(str::to_string);
            let lat_dec = cell(row, idx_lat).and_then(|s| parse_coordinate(Some(s)));
            let lon_dec = cell(row, idx_lon).and_then(|s| parse_coordinate(Some(s)));
            let azimuth = cell(row, idx_az).and_then(|s| parse_azimuth(Some(s)));

            let is_meaningful = imei.is_some()
                && lat_raw.is_some()
                && lon_raw.is_some()
                && lat_dec.is_some()
                && lon_dec.is_some()
                && azimuth.map(|a| a != 0.0).unwrap_or(false);
            if !is_meaningful {
                continue;
            }

            let record_type = cell(row, idx_tipo).map(map_tipo).unwrap_or(RecordType::Ninguno);
            let duration_sec = cell(row, idx_dur).and_then(parse_duration_seconds).unwrap_or(0);
            let number_b = cell(row, idx_b).and_then(|s| clean_msisdn(Some(s)));

            // The row filter above already requires both decimal coordinates,
            // so the "both absent" branch of the source formula is
            // unreachable here and every surviving record gets `None`.
            let target_coordinate = None;

            candidates.push(CanonicalRecord {
                file_id: ctx.file_id,
                number_a,
                number_b,
                record_type,
                event_at,
                duration_sec,
                latitude_raw: lat_raw,
                longitude_raw: lon_raw,
                azimuth,
                latitude_dec: lat_dec,
                longitude_dec: lon_dec,
                altitude: 0.0,
                target_coordinate,
                imei,
                phone: None,
            });
        }

        dedup_keep_max_duration(candidates)
    }
}

fn dedup_keep_max_duration(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut best: HashMap<(String, i64, String, String), CanonicalRecord> = HashMap::new();

    for rec in records {
        let key = (
            rec.number_a.clone(),
            rec.event_at.timestamp(),
            rec.latitude_raw.clone().unwrap_or_default(),
            rec.longitude_raw.clone().unwrap_or_default(),
        );
        match best.get(&key) {
            Some(existing) if existing.duration_sec >= rec.duration_sec => {}
            _ => {
                best.insert(key, rec);
            }
        }
    }

    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext {
        ParseContext { file_id: 1, file_name: "telcel.xlsx".to_string() }
    }

    fn header() -> Vec<String> {
        vec![
            "numero a", "numero b", "tipo", "fecha", "hora", "durac", "imei", "latitud",
            "longitud", "azimuth",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn maps_voice_entrante_and_filters_meaningful_rows() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![vec![
                "5512345678".into(),
                "5587654321".into(),
                "voz entrante".into(),
                "15/03/2024".into(),
                "10:30:00".into(),
                "00:01:30".into(),
                "352099001761481".into(),
                "19.4326".into(),
                "-99.1332".into(),
                "180".into(),
            ]],
        };

        let out = TelcelParser.normalize(block, &ctx());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record_type, RecordType::VozEntrante);
        assert_eq!(out[0].duration_sec, 90);
    }

    #[test]
    fn drops_rows_missing_imei_or_zero_azimuth() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![vec![
                "5512345678".into(),
                "".into(),
                "datos".into(),
                "15/03/2024".into(),
                "10:30:00".into(),
                "5".into(),
                "".into(),
                "19.4326".into(),
                "-99.1332".into(),
                "0".into(),
            ]],
        };

        let out = TelcelParser.normalize(block, &ctx());
        assert!(out.is_empty());
    }

    #[test]
    fn dedup_keeps_longer_duration() {
        let row = |dur: &str| {
            vec![
                "5512345678".to_string(),
                "".to_string(),
                "voz entrante".to_string(),
                "15/03/2024".to_string(),
                "10:30:00".to_string(),
                dur.to_string(),
                "352099001761481".to_string(),
                "19.4326".to_string(),
                "-99.1332".to_string(),
                "180".to_string(),
            ]
        };
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![row("10"), row("90")],
        };

        let out = TelcelParser.normalize(block, &ctx());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_sec, 90);
    }
}
