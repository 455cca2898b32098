//! Core domain types shared across the ETL pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a `FileRecord`. Transitions are monotonic:
/// `Uploaded -> Queued -> Processing -> {Processed, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    Uploaded,
    Queued,
    Processing,
    Processed,
    Error,
}

impl FileState {
    /// The literal string stored in `sabanas.archivos.estado`.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "subido",
            Self::Queued => "en_cola",
            Self::Processing => "procesando",
            Self::Processed => "procesado",
            Self::Error => "error",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "subido" => Some(Self::Uploaded),
            "en_cola" => Some(Self::Queued),
            "procesando" => Some(Self::Processing),
            "procesado" => Some(Self::Processed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Row in `sabanas.archivos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub state: FileState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub carrier_id: Option<i64>,
    pub carrier_name: Option<String>,
}

/// `RecordType` — canonical per-row classification. Numeric values are a
/// storage contract: they must match `sabanas.ctg_tipo_registro_sabana`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    Datos = 0,
    MensajeriaMultimedia = 1,
    Mensaje2ViasEnt = 2,
    Mensaje2ViasSal = 3,
    VozEntrante = 4,
    VozSaliente = 5,
    VozTransfer = 6,
    VozTransito = 7,
    Ninguno = 8,
    Wifi = 9,
    ReenvioSal = 10,
    ReenvioEnt = 11,
}

impl RecordType {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// Row in `sabanas.registros_telefonicos`, ready for bulk insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub file_id: i64,
    pub number_a: String,
    pub number_b: Option<String>,
    pub record_type: RecordType,
    pub event_at: DateTime<Utc>,
    pub duration_sec: i32,
    pub latitude_raw: Option<String>,
    pub longitude_raw: Option<String>,
    pub azimuth: Option<f64>,
    pub latitude_dec: Option<f64>,
    pub longitude_dec: Option<f64>,
    pub altitude: f64,
    pub target_coordinate: Option<bool>,
    pub imei: Option<String>,
    pub phone: Option<String>,
}

/// Carrier identity, resolved by the dispatcher (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Carrier {
    Telcel,
    Movistar,
    Att,
    Altan,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telcel => "TELCEL",
            Self::Movistar => "MOVISTAR",
            Self::Att => "ATT",
            Self::Altan => "ALTAN",
        }
    }
}
