//! Job Lifecycle Engine (C6).
//!
//! Grounded in `original_source/app/services.py`'s `accept_job_sabana` and
//! `process_job_sabana`: the same three-step CAS sequence, and the same
//! "another worker already owns this" silent-return behavior on the second
//! transition of `process_job`.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::carriers::{altan::AltanParser, att::AttParser, movistar::MovistarParser, telcel::TelcelParser};
use crate::carriers::{CarrierParser, ParseContext};
use crate::config::SabanasConfig;
use crate::dispatcher;
use crate::domain::{Carrier, CanonicalRecord, FileRecord, FileState};
use crate::error::{Result, SabanasError};
use crate::ftp;
use crate::repository::SabanasRepository;
use crate::sheet::{multi_block, single_block, RawSheet};

/// Result of `accept_job`: a freshly minted job id and the record snapshot
/// at the moment of acceptance.
pub struct AcceptedJob {
    pub job_id: Uuid,
    pub file: FileRecord,
}

pub async fn accept_job(repo: &SabanasRepository, file_id: i64) -> Result<AcceptedJob> {
    let file = repo
        .get_file(file_id)
        .await?
        .ok_or_else(|| SabanasError::NotFound(format!("file {file_id} not found")))?;

    if file.state != FileState::Uploaded {
        return Err(SabanasError::Conflict(format!(
            "file {file_id} is in state '{}', expected 'uploaded'",
            file.state
        )));
    }

    let transitioned = repo
        .try_transition_state(file_id, FileState::Uploaded, FileState::Queued, false, false)
        .await?;
    if !transitioned {
        return Err(SabanasError::Conflict(format!("file {file_id} state changed before queuing")));
    }

    Ok(AcceptedJob { job_id: Uuid::new_v4(), file })
}

/// Runs off the request path, spawned by the HTTP handler. Every exit path
/// leaves the record in a terminal state (`processed` or `error`), except
/// when another worker already owns the job, in which case this returns
/// silently without touching the row.
pub async fn process_job(
    repo: Arc<SabanasRepository>,
    config: Arc<SabanasConfig>,
    file_id: i64,
    correlation_id: String,
) {
    let file = match repo.get_file(file_id).await {
        Ok(Some(f)) if f.state == FileState::Queued => f,
        Ok(Some(_)) | Ok(None) => return,
        Err(e) => {
            error!(correlation_id, file_id, error = %e, "failed to read file record");
            return;
        }
    };

    let transitioned = match repo
        .try_transition_state(file_id, FileState::Queued, FileState::Processing, true, false)
        .await
    {
        Ok(t) => t,
        Err(e) => {
            error!(correlation_id, file_id, error = %e, "failed to transition to processing");
            return;
        }
    };
    if !transitioned {
        return;
    }

    info!(correlation_id, file_id, path = %file.path, "processing started");

    if let Err(e) = run_processing(&repo, &config, &file, file_id, &correlation_id).await {
        warn!(correlation_id, file_id, error = %e, "processing failed, marking error");
        if let Err(mark_err) = repo.mark_error(file_id).await {
            error!(correlation_id, file_id, error = %mark_err, "failed to mark file as error");
        }
        return;
    }

    if let Err(e) = repo
        .try_transition_state(file_id, FileState::Processing, FileState::Processed, false, true)
        .await
    {
        error!(correlation_id, file_id, error = %e, "failed to transition to processed");
    }
}

async fn run_processing(
    repo: &SabanasRepository,
    config: &SabanasConfig,
    file: &FileRecord,
    file_id: i64,
    correlation_id: &str,
) -> Result<()> {
    let local_path = ftp::download(config, file_id, &file.path).await?;

    let carrier = dispatcher::dispatch(file.carrier_id, file.carrier_name.as_deref(), &file.path);
    info!(correlation_id, file_id, carrier = carrier.as_str(), "dispatched to carrier parser");

    let file_name = local_path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    let records = parse_with_carrier(carrier, &local_path, file_id, &file_name)?;

    info!(correlation_id, file_id, rows = records.len(), "parse complete");

    // Zero rows is a successful outcome (spec step 5): the file simply had
    // no in-scope rows. The replace still runs so a re-processed file with
    // now-empty content clears any stale rows from a prior run.
    repo.replace_records_for_file(file_id, &records).await?;

    Ok(())
}

fn parse_with_carrier(
    carrier: Carrier,
    local_path: &Path,
    file_id: i64,
    file_name: &str,
) -> Result<Vec<CanonicalRecord>> {
    let sheets = crate::sheet::load_all_sheets(local_path)?;
    let ctx = ParseContext { file_id, file_name: file_name.to_string() };

    let records = match carrier {
        Carrier::Telcel => collect_single_block(&sheets, &TelcelParser, &ctx),
        Carrier::Att => collect_single_block(&sheets, &AttParser, &ctx),
        Carrier::Altan => collect_single_block(&sheets, &AltanParser, &ctx),
        Carrier::Movistar => collect_multi_block(&sheets, &MovistarParser, &ctx),
    };

    Ok(records)
}

fn collect_single_block<P: CarrierParser>(sheets: &[RawSheet], parser: &P, ctx: &ParseContext) -> Vec<CanonicalRecord> {
    let tokens: std::collections::HashSet<&str> = parser.expected_tokens().iter().copied().collect();
    sheets
        .iter()
        .filter_map(|sheet| single_block(&tokens, sheet))
        .flat_map(|block| parser.normalize(block, ctx))
        .collect()
}

fn collect_multi_block<P: CarrierParser>(sheets: &[RawSheet], parser: &P, ctx: &ParseContext) -> Vec<CanonicalRecord> {
    let tokens: std::collections::HashSet<&str> = parser.expected_tokens().iter().copied().collect();
    sheets
        .iter()
        .flat_map(|sheet| multi_block(&tokens, sheet))
        .flat_map(|block| parser.normalize(block, ctx))
        .collect()
}
