use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The identity provider rejected a token request. Fatal, never retried.
    #[error("EDL authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to write output to {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Service mapping error: {0}")]
    Mapping(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Harmony job error: {0}")]
    Job(String),
}

/// A single failed page request.
///
/// These never leave the paginated fetcher: they are counted against the
/// error ceiling and logged.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("response status code: {status}, response: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}
