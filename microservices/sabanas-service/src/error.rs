//! Error types for the Sabanas ingestion service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SabanasError>;

#[derive(Error, Debug)]
pub enum SabanasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("State conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("FTP transfer failed: {0}")]
    Ftp(String),

    #[error("Spreadsheet parse failure: {0}")]
    Parse(String),

    #[error("Row validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SabanasError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) | Self::Database(_) | Self::Parse(_) | Self::Ftp(_)
            | Self::Validation(_) | Self::Internal(_) => 500,
            Self::Auth(_) => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Ftp(_) => "FTP_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<brivas_lumadb::LumaDbError> for SabanasError {
    fn from(err: brivas_lumadb::LumaDbError) -> Self {
        SabanasError::Database(err.to_string())
    }
}

impl From<std::io::Error> for SabanasError {
    fn from(err: std::io::Error) -> Self {
        SabanasError::Ftp(err.to_string())
    }
}
