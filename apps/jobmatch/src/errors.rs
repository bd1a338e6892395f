use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
///
/// Only run-fatal conditions travel as `AppError`. Per-job failures are
/// contained at the call site and never surface here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required resource: {0}")]
    MissingResource(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
