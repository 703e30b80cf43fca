use crate::domain::journal_parser::JournalParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("notion api error during {operation}: http {status}; body={body}")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("network error during {operation}: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },
    #[error("unexpected notion payload: {0}")]
    Payload(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("journal parse error: {0}")]
    Journal(#[from] JournalParseError),
}
