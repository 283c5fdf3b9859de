use reqwest::StatusCode;

/// Failures of the inverter transport and of a whole poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The login request was rejected or did not answer with JSON.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// A successful response without JSON, after the re-login and fallback were exhausted.
    #[error("`{path}` responded with `{content_type}` instead of JSON: {preview}")]
    UnexpectedResponseType { path: String, content_type: String, preview: String },

    #[error("`{path}` responded with {status}")]
    Status { path: String, status: StatusCode },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode the response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid inverter host `{0}`")]
    InvalidHost(String),

    /// The poll cycle failed once more after a forced re-login.
    #[error("update failed after a forced re-login: {0}")]
    UpdateFailed(Box<Self>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
