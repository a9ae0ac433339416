use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Backend,
}

/// Failure reported by the backend inside an otherwise successful response.
/// Displays as the bare message so it can be shown to the user verbatim.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an exception from a backend `error` field, inferring the code
    /// from the wording the backend uses.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let code = if lower.contains("not found") {
            ErrorCode::NotFound
        } else if lower.contains("invalid")
            || lower.contains("only .csv")
            || lower.contains("cannot generate data for empty table")
        {
            ErrorCode::Validation
        } else {
            ErrorCode::Backend
        };
        Self { code, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sample type: {0}")]
pub struct UnknownSampleType(pub String);
