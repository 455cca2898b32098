//! Altán CDR normalization (spec §4.4.4). No corresponding file exists in
//! the original source (`altan.py` is an import-only stub), so this parser
//! is built directly from the specification.

use std::collections::HashMap;

use crate::carriers::{cell, header_index, CarrierParser, ParseContext};
use crate::domain::{CanonicalRecord, RecordType};
use crate::normalize::{
    clean_imei, clean_msisdn, parse_coordinate, parse_duration_seconds, parse_movistar_datetime,
    parse_with_formats, GENERIC_DATETIME_FORMATS,
};
use crate::sheet::RawBlock;

pub struct AltanParser;

const TOKENS: &[&str] = &[
    "tipo de comunicacion",
    "numero origen",
    "numero destino",
    "duracion",
    "fecha de la comunicacion",
    "hora de la comunicacion",
    "etiqueta de localizacion",
    "latitud",
    "longitud",
    "imei",
    "imsi",
];

#[derive(PartialEq)]
enum Direction {
    Entrante,
    Saliente,
    Unknown,
}

fn direction(origen: &str, destino: &str, subscriber: &str) -> Direction {
    if destino == subscriber && origen != subscriber {
        Direction::Entrante
    } else if origen == subscriber && destino != subscriber {
        Direction::Saliente
    } else {
        Direction::Unknown
    }
}

fn map_tipo(tipo: &str, dir: &Direction) -> RecordType {
    let t = tipo.trim().to_uppercase();
    match (t.as_str(), dir) {
        ("VOZ", Direction::Entrante) => RecordType::VozEntrante,
        ("VOZ", Direction::Saliente) => RecordType::VozSaliente,
        ("SMS", Direction::Entrante) => RecordType::Mensaje2ViasEnt,
        ("SMS", Direction::Saliente) => RecordType::Mensaje2ViasSal,
        ("REENVIO", Direction::Entrante) => RecordType::ReenvioEnt,
        ("REENVIO", Direction::Saliente) => RecordType::ReenvioSal,
        ("DATOS", _) => RecordType::Datos,
        _ => RecordType::Ninguno,
    }
}

/// Most frequent non-null cleaned `NUMERO ORIGEN` in the block — the file's
/// inferred subscriber, since Altán feeds don't label which column is "A".
fn infer_subscriber(rows: &[Vec<String>], idx_origen: Option<usize>) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        if let Some(n) = cell(row, idx_origen).and_then(|s| clean_msisdn(Some(s))) {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    counts.into_iter().max_by_key(|(_, count)| *count).map(|(n, _)| n)
}

impl CarrierParser for AltanParser {
    fn expected_tokens(&self) -> &'static [&'static str] {
        TOKENS
    }

    fn normalize(&self, block: RawBlock, ctx: &ParseContext) -> Vec<CanonicalRecord> {
        let h = &block.header;
        let idx_tipo = header_index(h, &["tipo de comunicacion"]);
        let idx_origen = header_index(h, &["numero origen"]);
        let idx_destino = header_index(h, &["numero destino"]);
        let idx_dur = header_index(h, &["duracion"]);
        let idx_fecha = header_index(h, &["fecha de la comunicacion"]);
        let idx_hora = header_index(h, &["hora de la comunicacion"]);
        let idx_lat = header_index(h, &["latitud"]);
        let idx_lon = header_index(h, &["longitud"]);
        let idx_imei = header_index(h, &["imei"]);

        let Some(subscriber) = infer_subscriber(&block.rows, idx_origen) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();

        for row in &block.rows {
            let Some(origen) = cell(row, idx_origen).and_then(|s| clean_msisdn(Some(s))) else {
                continue;
            };
            let destino = cell(row, idx_destino).and_then(|s| clean_msisdn(Some(s))).unwrap_or_default();

            let dir = direction(&origen, &destino, &subscriber);

            let fecha = cell(row, idx_fecha).unwrap_or("");
            let hora = cell(row, idx_hora).unwrap_or("");
            let event_at = parse_movistar_datetime(fecha, hora).or_else(|| {
                parse_with_formats(&format!("{fecha} {hora}"), GENERIC_DATETIME_FORMATS)
            });
            let Some(event_at) = event_at else { continue };

            let lat_dec = cell(row, idx_lat).and_then(|s| parse_coordinate(Some(s)));
            let lon_dec = cell(row, idx_lon).and_then(|s| parse_coordinate(Some(s)));
            if lat_dec.is_none() || lon_dec.is_none() {
                continue;
            }

            let tipo_raw = cell(row, idx_tipo).unwrap_or("");
            let imei = clean_imei(cell(row, idx_imei));
            if tipo_raw.trim().eq_ignore_ascii_case("voz") && imei.is_none() {
                continue;
            }

            let record_type = map_tipo(tipo_raw, &dir);
            let duration_sec = cell(row, idx_dur).and_then(parse_duration_seconds).unwrap_or(0);
            let number_a = subscriber.clone();
            let number_b = if number_a == origen { Some(destino.clone()) } else { Some(origen.clone()) };

            candidates.push(CanonicalRecord {
                file_id: ctx.file_id,
                number_a,
                number_b,
                record_type,
                event_at,
                duration_sec,
                latitude_raw: cell(row, idx_lat).map(str::to_string),
                longitude_raw: cell(row, idx_lon).map(str::to_string),
                azimuth: Some(360.0),
                latitude_dec: lat_dec,
                longitude_dec: lon_dec,
                altitude: 0.0,
                // The row filter above already requires both decimal
                // coordinates, so the "both absent" branch of the source
                // formula is unreachable here.
                target_coordinate: None,
                imei,
                phone: None,
            });
        }

        let mut deduped = dedup(candidates);
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

fn dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut best: HashMap<String, CanonicalRecord> = HashMap::new();

    for rec in records {
        let key = format!(
            "{}|{}|{}|{}|{}|{}",
            rec.number_a,
            rec.number_b.clone().unwrap_or_default(),
            rec.record_type.as_i32(),
            rec.event_at.timestamp(),
            rec.latitude_dec.map(|v| v.to_bits()).unwrap_or_default(),
            rec.longitude_dec.map(|v| v.to_bits()).unwrap_or_default(),
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
        ParseContext { file_id: 1, file_name: "altan.xlsx".to_string() }
    }

    fn header() -> Vec<String> {
        vec![
            "tipo de comunicacion",
            "numero origen",
            "numero destino",
            "duracion",
            "fecha de la comunicacion",
            "hora de la comunicacion",
            "latitud",
            "longitud",
            "imei",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn infers_subscriber_and_direction() {
        let block = RawBlock {
            sheet_name: "s1".to_string(),
            header: header(),
            rows: vec![
                vec![
                    "VOZ".into(),
                    "5512345678".into(),
                    "5587654321".into(),
                    "30".into(),
                    "15/03/2024".into(),
                    "10:30:00".into(),
                    "19.4326".into(),
                    "-99.1332".into(),
                    "352099001761481".into(),
                ],
                vec![
                    "VOZ".into(),
                    "5512345678".into(),
                    "5599999999".into(),
                    "40".into(),
                    "15/03/2024".into(),
                    "11:00:00".into(),
                    "19.4326".into(),
                    "-99.1332".into(),
                    "352099001761481".into(),
                ],
            ],
        };

        let out = AltanParser.normalize(block, &ctx());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.number_a == "5512345678"));
        assert!(out.iter().all(|r| r.record_type == RecordType::VozSaliente));
        assert!(out.iter().all(|r| r.target_coordinate.is_none()));
    }
}
