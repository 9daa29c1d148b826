use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ApiError, NormalizedError, UNEXPECTED_ERROR_MESSAGE};

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

/// The `{statusCode, headers, body}` shape returned to API Gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ResponseEnvelope {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Builds envelopes over the fixed JSON + CORS headers plus any
/// process-wide defaults (service name, stage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeBuilder {
    headers: BTreeMap<String, String>,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self {
            headers: base_headers(),
        }
    }
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default header. The JSON content type and CORS origin are
    /// fixed and cannot be replaced.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if !is_fixed_header(&name) {
            self.headers.insert(name, value.into());
        }
        self
    }

    pub fn build(&self, status_code: u16, body: impl Serialize) -> ResponseEnvelope {
        self.build_with_headers(status_code, body, &[])
    }

    pub fn build_with_headers(
        &self,
        status_code: u16,
        body: impl Serialize,
        extra_headers: &[(&str, &str)],
    ) -> ResponseEnvelope {
        let mut headers = self.headers.clone();
        for (name, value) in extra_headers {
            if !is_fixed_header(name) {
                headers.insert(name.to_string(), value.to_string());
            }
        }

        match render_body(&body) {
            Ok(body) => ResponseEnvelope {
                status_code,
                headers,
                body,
            },
            Err(error) => {
                tracing::error!(
                    status_code,
                    error_message = %error,
                    "failed to serialize response body"
                );
                let fallback = ApiError::internal(UNEXPECTED_ERROR_MESSAGE).to_body();
                ResponseEnvelope {
                    status_code: fallback.status_code,
                    headers,
                    body: serde_json::to_string(&fallback).unwrap_or_default(),
                }
            }
        }
    }

    pub fn error(&self, normalized: &NormalizedError) -> ResponseEnvelope {
        self.build(normalized.status_code, &normalized.body)
    }
}

pub fn build_response(
    status_code: u16,
    body: impl Serialize,
    extra_headers: &[(&str, &str)],
) -> ResponseEnvelope {
    EnvelopeBuilder::default().build_with_headers(status_code, body, extra_headers)
}

fn base_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()),
        (ALLOW_ORIGIN_HEADER.to_string(), "*".to_string()),
    ])
}

fn is_fixed_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) || name.eq_ignore_ascii_case(ALLOW_ORIGIN_HEADER)
}

// A body that is already a string is passed through untouched.
fn render_body(body: &impl Serialize) -> Result<String, serde_json::Error> {
    match serde_json::to_value(body)? {
        Value::String(text) => Ok(text),
        value => serde_json::to_string(&value),
    }
}
