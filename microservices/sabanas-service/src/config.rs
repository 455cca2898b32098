//! Configuration management for the Sabanas service.

use crate::error::{Result, SabanasError};
use std::env;

#[derive(Debug, Clone)]
pub struct SabanasConfig {
    pub http_bind: String,
    pub database_url: String,
    pub ftp_host: String,
    pub ftp_user_ro: String,
    pub ftp_pass_ro: String,
    pub local_tmp_dir: String,
    pub service_api_key: String,
}

impl SabanasConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_bind: env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: env::var("DATABASE_URL").map_err(|_| {
                SabanasError::Config("DATABASE_URL is required".to_string())
            })?,
            ftp_host: env::var("FTP_HOST")
                .unwrap_or_else(|_| "ftp://192.168.100.200/".to_string()),
            ftp_user_ro: env::var("FTP_USER_RO").unwrap_or_default(),
            ftp_pass_ro: env::var("FTP_PASS_RO").unwrap_or_default(),
            local_tmp_dir: env::var("LOCAL_TMP_DIR").unwrap_or_else(|_| "/tmp/sabanas".to_string()),
            service_api_key: env::var("SERVICE_API_KEY").map_err(|_| {
                SabanasError::Config("SERVICE_API_KEY is required".to_string())
            })?,
        })
    }
}
