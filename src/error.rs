use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MgError {
    #[error("a project or metagenome id is required")]
    MissingIdentifier,

    #[error("invalid {kind} id: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("dir '{0}' does not exist")]
    MissingDirectory(PathBuf),

    #[error("--user and --passwd must be given together")]
    IncompleteLogin,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("catalog returned status {status}: {message}")]
    CatalogStatus { status: u16, message: String },

    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),

    #[error("catalog reported an error: {0}")]
    RemoteReported(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("transfer failed: {0}")]
    TransferHttp(String),

    #[error("transfer returned status {status}: {message}")]
    TransferStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl MgError {
    /// True for failures detected before any network traffic.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            MgError::MissingIdentifier
                | MgError::InvalidIdentifier { .. }
                | MgError::MissingDirectory(_)
                | MgError::IncompleteLogin
        )
    }
}
