//! Plain FTP download client.
//!
//! Grounded in `original_source/app/services/ftp_client.py`'s `ftp_download`:
//! connect, log in, `cwd` into the remote directory segment by segment,
//! `RETR` the file in binary mode. `suppaftp`'s client is blocking, so every
//! call here runs inside `tokio::task::spawn_blocking`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use suppaftp::FtpStream;

use crate::config::SabanasConfig;
use crate::error::{Result, SabanasError};

/// Download `remote_path` (relative to the FTP root) into
/// `<local_tmp_dir>/<file_id>/<basename>`, creating the scratch directory if
/// needed. Returns the local path of the downloaded file.
pub async fn download(config: &SabanasConfig, file_id: i64, remote_path: &str) -> Result<PathBuf> {
    let host = strip_ftp_scheme(&config.ftp_host);
    let user = config.ftp_user_ro.clone();
    let pass = config.ftp_pass_ro.clone();
    let remote_path = remote_path.to_string();
    let local_tmp_dir = config.local_tmp_dir.clone();

    tokio::task::spawn_blocking(move || {
        download_blocking(&host, &user, &pass, file_id, &remote_path, &local_tmp_dir)
    })
    .await
    .map_err(|e| SabanasError::Ftp(format!("download task panicked: {e}")))?
}

fn strip_ftp_scheme(host: &str) -> String {
    let bare = host.trim_start_matches("ftp://").trim_end_matches('/').to_string();
    if bare.contains(':') {
        bare
    } else {
        format!("{bare}:21")
    }
}

fn download_blocking(
    host: &str,
    user: &str,
    pass: &str,
    file_id: i64,
    remote_path: &str,
    local_tmp_dir: &str,
) -> Result<PathBuf> {
    let mut ftp = FtpStream::connect(host).map_err(|e| SabanasError::Ftp(e.to_string()))?;
    ftp.login(user, pass).map_err(|e| SabanasError::Ftp(e.to_string()))?;

    let segments: Vec<&str> = remote_path.split('/').filter(|s| !s.is_empty()).collect();
    let (dirs, basename) = match segments.split_last() {
        Some((last, rest)) => (rest, *last),
        None => return Err(SabanasError::Ftp(format!("empty remote path: {remote_path}"))),
    };

    for dir in dirs {
        ftp.cwd(dir).map_err(|e| SabanasError::Ftp(format!("cwd '{dir}' failed: {e}")))?;
    }

    let bytes = ftp
        .retr_as_buffer(basename)
        .map_err(|e| SabanasError::Ftp(format!("RETR '{basename}' failed: {e}")))?
        .into_inner();

    let _ = ftp.quit();

    let dest_dir = Path::new(local_tmp_dir).join(file_id.to_string());
    fs::create_dir_all(&dest_dir)?;
    let dest_path = dest_dir.join(basename);

    let mut file = fs::File::create(&dest_path)?;
    file.write_all(&bytes)?;

    Ok(dest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_trailing_slash_and_adds_default_port() {
        assert_eq!(strip_ftp_scheme("ftp://192.168.100.200/"), "192.168.100.200:21");
        assert_eq!(strip_ftp_scheme("192.168.100.200"), "192.168.100.200:21");
        assert_eq!(strip_ftp_scheme("192.168.100.200:2121"), "192.168.100.200:2121");
    }
}
