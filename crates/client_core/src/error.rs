use shared::error::UnknownSampleType;
use thiserror::Error;

/// Problems detected locally, before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Invalid file type. Please upload a .csv, .json, or .jsonl file.")]
    InvalidFileType { file_name: String },
    #[error(transparent)]
    UnknownSample(#[from] UnknownSampleType),
    #[error("unknown drop zone: {0}")]
    UnknownZone(String),
}

/// Text shown for a failed backend call: the failure's own message, or
/// `fallback` when it has none.
pub(crate) fn failure_message(err: &anyhow::Error, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
