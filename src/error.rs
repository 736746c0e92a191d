//! Error types for the remote conversation log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteLogError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote log returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed remote log payload: {0}")]
    Decode(String),
}
