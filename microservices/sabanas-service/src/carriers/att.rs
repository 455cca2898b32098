//! AT&T CDR normalization (spec §4.4.3), ported from
//! `original_source/app/services/att.py`.

use std::collections::HashMap;

use crate::carriers::{cell, header_index, CarrierParser, ParseContext};
use crate::domain::{CanonicalRecord, RecordType};
use crate::normalize::{
    clean_imei, clean_msisdn, expand_two_digit_year, extract_msisdn_from_filename, parse_azimuth,
    parse_coordinate, parse_duration_seconds, parse_with_formats, pick_last_nonzero,
    zero_pad_hour, GENERIC_DATETIME_FORMATS,
};
use crate::sheet::RawBlock;

pub struct AttParser;

const TOKENS: &[&str] =
    &["numero a", "numero b", "imei", "serv", "t_reg", "fecha", "hora", "dur", "latitud", "longitud", "azimuth"];

fn map_tipo(serv: &str, t_reg: &str, number_a: &str, phone: &Option<String>) -> RecordType {
    let serv = serv.trim().to_lowercase();
    let t_reg = t_reg.trim().to_lowercase();

    if serv.starts_with("data") || serv.starts_with("datos") {
        return RecordType::Datos;
    }
    if serv.starts_with("mms") {
        return RecordType::MensajeriaMultimedia;
    }
    if serv.starts_with("voz") {
        return match t_reg.as_str() {
            "ent" => RecordType::VozEntrante,
            "sal" => RecordType::VozSaliente,
            _ => {
                if phone.as_deref() == Some(number_a) {
                    RecordType::VozSaliente
                } else {
                    RecordType::Ninguno
                }
            }
        };
    }
    if serv.starts_with("sms") {
        return match t_reg.as_str() {
            "ent" => RecordType::Mensaje2ViasEnt,
            "sal" => RecordType::Mensaje2ViasSal,
            _ => {
                if phone.as_deref() == Some(number_a) {
                    RecordType::Mensaje2ViasSal
                } else {
                    RecordType::Ninguno
                }
            }
        };
    }
    RecordType::Ninguno
}

/// Read a lat/lon cell that may be a plain value or an AT&T `[a:b:c]` list.
fn parse_listable_coordinate(raw: &str) -> Option<f64> {
    if raw.trim().starts_with('[') {
        let picked = pick_last_nonzero(raw)?;
        parse_coordinate(Some(picked))
    } else {
        parse_coordinate(Some(raw))
    }
}

impl CarrierParser for AttParser {
    fn expected_tokens(&self) -> &'static [&'static str] {
        TOKENS
    }

    fn normalize(&self, block: RawBlock, ctx: &ParseContext) -> Vec<CanonicalRecord> {
        let phone = extract_msisdn_from_filename(&ctx.file_name);

        let h = &block.header;
        let idx_a = header_index(h, &["numero a"]);
        let idx_b = header_index(h, &["numero b"]);
        let idx_serv = header_index(h, &["serv"]);
        let idx_treg = header_index(h, &["t_reg"]);
        let idx_fecha = header_index(h, &["fecha"]);
        let idx_hora = header_index(h, &["hora"]);
        let idx_dur = header_index(h, &["dur"]);
        let idx_imei = header_index(h, &["imei", "num a imei"]);
        let idx_lat = header_index(h, &["latitud"]);
        let idx_lon = header_index(h, &["longitud"]);
        let idx_az = header_index(h, &["azimuth"]);

        let mut candidates = Vec::new();

        for row in &block.rows {
            let number_a_raw = cell(row, idx_a);
            let number_a = number_a_raw.and_then(|s| clean_msisdn(Some(s)));
            if number_a.is_none() && phone.is_none() {
                continue;
            }
            let number_a = number_a.unwrap_or_else(|| phone.clone().unwrap());

            let fecha = cell(row, idx_fecha).unwrap_or("");
            let hora_raw = cell(row, idx_hora).unwrap_or("");
            let hora = zero_pad_hour(hora_raw);
            let combined = expand_two_digit_year(&format!("{fecha} {hora}"));
            let fecha_only = expand_two_digit_year(fecha);
            let Some(event_at) = parse_with_formats(&combined, GENERIC_DATETIME_FORMATS)
                .or_else(|| parse_with_formats(&fecha_only, GENERIC_DATETIME_FORMATS))
            else {
                continue;
            };

            let lat_raw = cell(row, idx_lat).map(str::to_string);
            let lon_raw = cell(row, idx_lon).map(str::to_string);
            let lat_dec = cell(row, idx_lat).and_then(parse_listable_coordinate);
            let lon_dec = cell(row, idx_lon).and_then(parse_listable_coordinate);
            let azimuth = cell(row, idx_az).and_then(|s| parse_azimuth(Some(s)));

            let is_meaningful = lat_raw.is_some()
                && lon_raw.is_some()
                && lat_dec.is_some()
                && lon_dec.is_some()
                && azimuth.map(|a| a != 0.0).unwrap_or(false);
            if !is_meaningful {
                continue;
            }

            let serv = cell(row, idx_serv).unwrap_or("");
            let t_reg = cell(row, idx_treg).unwrap_or("");
            let record_type = map_tipo(serv, t_reg, &number_a, &phone);
            let duration_sec = cell(row, idx_dur).and_then(parse_duration_seconds).unwrap_or(0);
            let imei = clean_imei(cell(row, idx_imei));
            let number_b = cell(row, idx_b).and_then(|s| clean_msisdn(Some(s)));

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
                // The row filter above already requires both decimal
                // coordinates, so the "both absent" branch of the source
                // formula is unreachable here.
                target_coordinate: None,
                imei,
                phone: phone.clone(),
            });
        }

        dedup(candidates)
    }
}

fn dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut best: HashMap<String, CanonicalRecord> = HashMap::new();

    for rec in records {
        let key = if rec.latitude_raw.is_some() && rec.longitude_raw.is_some() {
            format!(
                "{}|{}|{}|{}",
                rec.number_a,
                rec.event_at.timestamp(),
                rec.latitude_raw.clone().unwrap_or_default(),
                rec.longitude_raw.clone().unwrap_or_default()
            )
        } else {
            format!(
                "{}|{}|{}",
                rec.number_a,
                rec.event_at.timestamp(),
                rec.number_b.clone().unwrap_or_default()
            )
        };

        match best.get(&key) {
            Some(existing) if existing.duration_sec >= rec.duration_sec => {}
            _ => {
                best.insert(key, rec);
            }
        }
    }

    best.into_values().collect()
}
