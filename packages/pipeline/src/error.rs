use dealflow_client::ApiError;
use thiserror::Error;

/// Pipeline store errors.
///
/// Kept cheap to clone so the store can retain the most recent failure and
/// hand copies to readers through `last_error()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Deal not found: {0}")]
    DealNotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether this failure carries field-level validation issues
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Api(ApiError::Validation(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_convert_and_display() {
        let err: StoreError = ApiError::NotFound("deal d-1".to_string()).into();
        assert_eq!(err.to_string(), "API error: Not found: deal d-1");
        assert!(!err.is_validation());

        let err: StoreError = ApiError::Validation(vec![]).into();
        assert!(err.is_validation());
    }
}
