use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One field-level problem from a 400/422 response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Deal API errors.
///
/// Payloads are plain strings rather than source errors so the store can keep
/// the last error around and hand out clones to readers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<ValidationIssue>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Field-level issues when this is a validation failure
    pub fn validation_issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            ApiError::Validation(issues) => Some(issues),
            _ => None,
        }
    }
}
