use thiserror::Error;

/// Startup configuration problems. Any of these is fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure of a single model backend attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Usage file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Usage record error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("All model backends failed: {}", .last_error.as_deref().unwrap_or("unknown error"))]
    AllBackendsFailed { last_error: Option<String> },

    #[error("No model backends configured")]
    NoBackends,
}

impl GenerationError {
    /// Diagnostic detail passed back to the client.
    pub fn details(&self) -> Option<String> {
        match self {
            GenerationError::AllBackendsFailed { last_error } => last_error.clone(),
            GenerationError::NoBackends => Some(self.to_string()),
        }
    }
}
