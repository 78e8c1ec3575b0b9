//! Cloud-side error types

use infradoc_core::{CoreError, OptionLevel, ValidationError};
use thiserror::Error;

/// Errors raised by the inventory backend, the task client and the session
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Failed to load {level} options: {message}")]
    ScopeLoad { level: OptionLevel, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Collection request rejected: {0}")]
    Submission(String),

    #[error("Collection task failed on the server: {0}")]
    ServerTaskFailure(String),

    #[error("Network error while polling task status: {0}")]
    Transport(String),

    #[error("A collection task is already running: {0}")]
    TaskInFlight(String),

    #[error("Collection task was cancelled")]
    Cancelled,

    #[error("No collected snapshot available")]
    NoSnapshot,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CoreError> for CloudError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ScopeLoad { level, message } => CloudError::ScopeLoad { level, message },
            CoreError::Validation(e) => CloudError::Validation(e),
        }
    }
}

impl CloudError {
    /// Whether the operator can fix the input and try again right away
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CloudError::ScopeLoad { .. } | CloudError::Validation(_) | CloudError::TaskInFlight(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
