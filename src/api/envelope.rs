//! Response envelope decoding.
//!
//! Every endpoint answers with `{ "data": ..., "message": "...", "errors": { field: [..] } }`.

use reqwest::StatusCode;
use rustc_hash::FxHashMap;
use serde::{Deserialize, de::DeserializeOwned};

use super::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    errors: Option<FxHashMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct FailureEnvelope {
    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    errors: Option<FxHashMap<String, Vec<String>>>,
}

/// Decode a response body, requiring a `data` member on success.
pub(super) fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(rejected(status, body));
    }

    let envelope: Envelope<T> = serde_json::from_slice(body)?;

    if envelope.data.is_none() {
        if let Some(message) = envelope.message {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
                errors: envelope.errors.unwrap_or_default(),
            });
        }
    }

    envelope.data.ok_or(ApiError::MissingData)
}

/// Decode a response body where only the status matters.
pub(super) fn decode_empty(status: StatusCode, body: &[u8]) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(rejected(status, body))
    }
}

fn rejected(status: StatusCode, body: &[u8]) -> ApiError {
    let parsed = serde_json::from_slice::<FailureEnvelope>(body).ok();

    let (message, errors) = match parsed {
        Some(FailureEnvelope { message, errors }) => (message, errors.unwrap_or_default()),
        None => (None, FxHashMap::default()),
    };

    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    ApiError::Rejected {
        status: status.as_u16(),
        message,
        errors,
    }
}
