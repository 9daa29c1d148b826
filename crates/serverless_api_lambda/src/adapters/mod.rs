pub mod dynamodb;
pub mod item_store;
pub mod object_store;
pub mod s3;

use serverless_api_core::errors::{ApiError, INTERNAL_ERROR_MESSAGE};
use thiserror::Error;

/// Failure reported by a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(error: impl std::fmt::Display) -> Self {
        Self::Backend(error.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => ApiError::not_found(message),
            StoreError::Backend(message) => {
                tracing::error!(error_message = %message, "storage backend failure");
                ApiError::internal(INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serverless_api_core::errors::ErrorKind;

    use super::*;

    #[test]
    fn backend_failures_hide_their_text() {
        let error = ApiError::from(StoreError::backend("throttled: table items-dev"));

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn not_found_keeps_its_message() {
        let error = ApiError::from(StoreError::NotFound("File not found: a.txt".to_string()));

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), "File not found: a.txt");
    }
}
