//! Repository Contract (C5) — the only module that talks SQL.
//!
//! Grounded in `original_source/app/domain/repository.py`: `get_archivo_by_id`,
//! `try_mark_estado`, `mark_error`, `delete_registros_telefonicos_by_archivo`,
//! and `insert_registros_telefonicos_bulk`.

use chrono::{DateTime, Datelike, Utc};

use crate::domain::{CanonicalRecord, FileRecord, FileState};
use crate::error::{Result, SabanasError};
use brivas_lumadb::LumaDbPool;

pub struct SabanasRepository {
    pool: LumaDbPool,
}

impl SabanasRepository {
    pub fn new(pool: LumaDbPool) -> Self {
        Self { pool }
    }

    pub async fn get_file(&self, id: i64) -> Result<Option<FileRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id_sabanas, ruta, estado, fecha_inicio, fecha_termino, \
                 compania, id_compania_telefonica \
                 FROM sabanas.archivos WHERE id_sabanas = $1",
                &[&id],
            )
            .await
            .map_err(|e| SabanasError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let estado: String = row.get("estado");
        let state = FileState::from_db_str(&estado)
            .ok_or_else(|| SabanasError::Database(format!("unknown estado '{estado}'")))?;

        Ok(Some(FileRecord {
            id: row.get("id_sabanas"),
            path: row.get("ruta"),
            state,
            started_at: row.get("fecha_inicio"),
            finished_at: row.get("fecha_termino"),
            carrier_id: row.get("id_compania_telefonica"),
            carrier_name: row.get("compania"),
        }))
    }

    /// Atomically move a file from `expected` to `next`. Returns `true` if
    /// this call performed the transition (affected exactly one row);
    /// `false` means another caller already moved it, or it never matched.
    /// This is the single compare-and-set primitive the whole engine relies
    /// on for single-owner processing (invariant I2).
    pub async fn try_transition_state(
        &self,
        id: i64,
        expected: FileState,
        next: FileState,
        set_started_at: bool,
        set_finished_at: bool,
    ) -> Result<bool> {
        let client = self.pool.get().await?;

        let affected = match (set_started_at, set_finished_at) {
            (true, false) => {
                client
                    .execute(
                        "UPDATE sabanas.archivos SET estado = $1, fecha_inicio = now() \
                         WHERE id_sabanas = $2 AND estado = $3",
                        &[&next.as_db_str(), &id, &expected.as_db_str()],
                    )
                    .await
            }
            (false, true) => {
                client
                    .execute(
                        "UPDATE sabanas.archivos SET estado = $1, fecha_termino = now() \
                         WHERE id_sabanas = $2 AND estado = $3",
                        &[&next.as_db_str(), &id, &expected.as_db_str()],
                    )
                    .await
            }
            (true, true) => {
                client
                    .execute(
                        "UPDATE sabanas.archivos SET estado = $1, fecha_inicio = now(), \
                         fecha_termino = now() WHERE id_sabanas = $2 AND estado = $3",
                        &[&next.as_db_str(), &id, &expected.as_db_str()],
                    )
                    .await
            }
            (false, false) => {
                client
                    .execute(
                        "UPDATE sabanas.archivos SET estado = $1 \
                         WHERE id_sabanas = $2 AND estado = $3",
                        &[&next.as_db_str(), &id, &expected.as_db_str()],
                    )
                    .await
            }
        }
        .map_err(|e| SabanasError::Database(e.to_string()))?;

        Ok(affected == 1)
    }

    /// Unconditional mark-error, used when processing fails past the point
    /// where a normal CAS transition still applies (e.g. mid-parse).
    pub async fn mark_error(&self, id: i64) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE sabanas.archivos SET estado = $1, fecha_termino = now() \
                 WHERE id_sabanas = $2",
                &[&FileState::Error.as_db_str(), &id],
            )
            .await
            .map_err(|e| SabanasError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn set_carrier(&self, id: i64, carrier_id: i64, carrier_name: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE sabanas.archivos SET id_compania_telefonica = $1, compania = $2 \
                 WHERE id_sabanas = $3",
                &[&carrier_id, &carrier_name, &id],
            )
            .await
            .map_err(|e| SabanasError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all existing rows for `file_id` and insert `records` in their
    /// place, in a single transaction. A re-run of a processed file always
    /// replaces rather than appends.
    pub async fn replace_records_for_file(
        &self,
        file_id: i64,
        records: &[CanonicalRecord],
    ) -> Result<u64> {
        let mut client = self.pool.get().await?;
        let txn = client
            .transaction()
            .await
            .map_err(|e| SabanasError::Database(e.to_string()))?;

        txn.execute(
            "DELETE FROM sabanas.registros_telefonicos WHERE id_sabanas = $1",
            &[&file_id],
        )
        .await
        .map_err(|e| SabanasError::Database(e.to_string()))?;

        let threshold_year = Utc::now().year() + 1;
        let mut inserted: u64 = 0;

        for rec in records {
            validate_event_year(rec.event_at, threshold_year)?;

            txn.execute(
                "INSERT INTO sabanas.registros_telefonicos \
                 (id_sabanas, numero_a, numero_b, id_tipo_registro, fecha_hora, duracion, \
                  latitud, longitud, azimuth, latitud_decimal, longitud_decimal, altitud, \
                  coordenada_objetivo, imei, telefono) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
                &[
                    &file_id,
                    &rec.number_a,
                    &non_empty(rec.number_b.as_deref()),
                    &rec.record_type.as_i32(),
                    &rec.event_at,
                    &rec.duration_sec,
                    &non_empty(rec.latitude_raw.as_deref()),
                    &non_empty(rec.longitude_raw.as_deref()),
                    &rec.azimuth,
                    &rec.latitude_dec,
                    &rec.longitude_dec,
                    &rec.altitude,
                    &rec.target_coordinate,
                    &non_empty(rec.imei.as_deref()),
                    &non_empty(rec.phone.as_deref()),
                ],
            )
            .await
            .map_err(|e| SabanasError::Database(e.to_string()))?;

            inserted += 1;
        }

        txn.commit().await.map_err(|e| SabanasError::Database(e.to_string()))?;
        Ok(inserted)
    }
}

/// Empty strings are stored as NULL, matching the original's
/// `None if not value else value` normalization before insert.
fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Reject rows whose event year falls outside a sane range. The original
/// guards against spreadsheet garbage (stray `1900` or far-future dates)
/// with `threshold_year = now.year + 1`.
fn validate_event_year(event_at: DateTime<Utc>, threshold_year: i32) -> Result<()> {
    let year = event_at.year();
    if year < 1970 || year > threshold_year {
        return Err(SabanasError::Validation(format!(
            "event_at year {year} out of accepted range (1970..={threshold_year})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brivas_lumadb::PoolConfig;

    async fn test_repo() -> Option<SabanasRepository> {
        if std::env::var("LUMADB_URL").is_err() {
            return None;
        }
        let pool = LumaDbPool::new(PoolConfig::from_env()).await.ok()?;
        Some(SabanasRepository::new(pool))
    }

    #[tokio::test]
    async fn get_missing_file_returns_none() {
        let Some(repo) = test_repo().await else { return };
        let result = repo.get_file(i64::MAX).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn year_threshold_rejects_far_future() {
        let far_future = Utc::now().with_year(2999).unwrap();
        assert!(validate_event_year(far_future, Utc::now().year() + 1).is_err());
    }

    #[test]
    fn year_threshold_accepts_current_year() {
        assert!(validate_event_year(Utc::now(), Utc::now().year() + 1).is_ok());
    }

    #[test]
    fn year_threshold_rejects_before_1970() {
        let pre_epoch = Utc::now().with_year(1969).unwrap();
        assert!(validate_event_year(pre_epoch, Utc::now().year() + 1).is_err());
    }

    #[test]
    fn year_threshold_accepts_1970() {
        let epoch_year = Utc::now().with_year(1970).unwrap();
        assert!(validate_event_year(epoch_year, Utc::now().year() + 1).is_ok());
    }
}
