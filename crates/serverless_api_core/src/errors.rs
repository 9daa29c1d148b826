//! Closed error taxonomy shared by every handler and the normalizer that
//! turns any failure into the uniform error body.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::contract::now_iso8601;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

pub type Details = Map<String, Value>;

/// Boxed failure type used at handler boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    ValidationFailed,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::ValidationFailed => 422,
            Self::Internal => 500,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::ValidationFailed => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequestError",
            Self::NotFound => "NotFoundError",
            Self::Conflict => "ConflictError",
            Self::ValidationFailed => "ValidationError",
            Self::Internal => "InternalServerError",
        }
    }
}

/// A classified API failure. Status and code always come from the kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    details: Details,
    timestamp: String,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Details::new(),
            timestamp: now_iso8601(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Multi-field schema failure; details are always `{errors: {field: message}}`.
    pub fn validation_failed(errors: BTreeMap<String, String>) -> Self {
        let errors: Details = errors
            .into_iter()
            .map(|(field, message)| (field, Value::String(message)))
            .collect();
        Self::new(ErrorKind::ValidationFailed, VALIDATION_FAILED_MESSAGE)
            .with_detail("errors", Value::Object(errors))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details.extend(details);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status_code(),
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.message.clone(),
                timestamp: self.timestamp.clone(),
                details: self.details.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Details,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedError {
    pub status_code: u16,
    pub body: ErrorBody,
}

/// Maps any failure onto its status and error body.
///
/// Unclassified failures become a 500 whose message never echoes the
/// original error text.
pub fn normalize_error(error: &(dyn std::error::Error + 'static)) -> NormalizedError {
    let body = match error.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.to_body(),
        None => ApiError::internal(UNEXPECTED_ERROR_MESSAGE).to_body(),
    };

    NormalizedError {
        status_code: body.status_code,
        body,
    }
}

/// Logs one structured record for `error`, then normalizes it.
pub fn report_error(function: &str, error: &(dyn std::error::Error + 'static)) -> NormalizedError {
    let error_type = error
        .downcast_ref::<ApiError>()
        .map(|api_error| api_error.kind().type_name())
        .unwrap_or("UnexpectedError");
    let normalized = normalize_error(error);
    let details = Value::Object(normalized.body.error.details.clone());

    if normalized.status_code >= 500 {
        tracing::error!(
            function,
            error_type,
            error_message = %error,
            status_code = normalized.status_code,
            details = %details,
            "Error occurred"
        );
    } else {
        tracing::warn!(
            function,
            error_type,
            error_message = %error,
            status_code = normalized.status_code,
            details = %details,
            "Error occurred"
        );
    }

    normalized
}
