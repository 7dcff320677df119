use crate::validation::ValidationErrors;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A non-2xx answer from the admin API, kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    pub status: u16,
    pub message: String,
    pub details: Vec<String>,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)?;
        if !self.details.is_empty() {
            write!(f, ": {}", self.details.join("; "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("API request failed: {0}")]
    Api(ApiFailure),
    #[error("transport error at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("generator submission blocked: {0}")]
    SubmissionBlocked(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AdminError {
    /// User-facing status line, with API detail lists preserved.
    pub fn status_message(&self) -> String {
        match self {
            AdminError::Api(failure) => failure.to_string(),
            other => other.to_string(),
        }
    }
}

pub type AdminResult<T> = Result<T, AdminError>;
