use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend request. Callers never see a partially
/// decoded body: anything that is not a complete, well-formed response
/// becomes one of these.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Backend unreachable ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Backend rejected {url}: {message}")]
    Rejected { url: String, message: String },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// True when the backend could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
