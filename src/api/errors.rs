//! API errors.

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors surfaced by the REST collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, timeout or body read error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code
        status: u16,

        /// Human-readable message from the envelope, or the status text
        message: String,

        /// Per-field validation messages
        errors: FxHashMap<String, Vec<String>>,
    },

    /// The body was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx envelope arrived without a `data` member.
    #[error("response did not contain data")]
    MissingData,
}

impl ApiError {
    /// The user-facing message for this error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Http(error) if error.is_timeout() => "The request timed out".to_string(),
            ApiError::Http(_) => "Unable to reach the server".to_string(),
            ApiError::Decode(_) | ApiError::MissingData => {
                "The server returned an unexpected response".to_string()
            }
        }
    }

    /// Messages for a single field, if the server reported any.
    pub fn field_errors(&self, field: &str) -> &[String] {
        match self {
            ApiError::Rejected { errors, .. } => errors.get(field).map_or(&[], Vec::as_slice),
            _ => &[],
        }
    }
}
