//! API Gateway and storage-notification handlers.
//!
//! HTTP handlers always answer with exactly one [`ResponseEnvelope`]: any
//! failure is reported once through [`report_error`] and rendered with the
//! function's envelope builder.

pub mod files;
pub mod hello;
pub mod items;
pub mod storage_events;

use serverless_api_core::errors::{report_error, ApiError, BoxError};
use serverless_api_core::request::ApiRequest;
use serverless_api_core::response::{EnvelopeBuilder, ResponseEnvelope};

use crate::config::AppConfig;

pub const SERVICE_HEADER: &str = "X-Service";
pub const STAGE_HEADER: &str = "X-Stage";

pub type HandlerResult = Result<ResponseEnvelope, BoxError>;

/// Per-invocation context shared by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct HttpContext<'a> {
    pub config: &'a AppConfig,
    pub request_id: String,
    pub envelopes: EnvelopeBuilder,
}

impl<'a> HttpContext<'a> {
    pub fn new(config: &'a AppConfig, request_id: impl Into<String>) -> Self {
        Self {
            config,
            request_id: request_id.into(),
            envelopes: envelope_builder(config),
        }
    }

    /// Unwraps a handler result, turning any failure into its error envelope.
    pub fn respond(&self, function: &str, result: HandlerResult) -> ResponseEnvelope {
        match result {
            Ok(response) => {
                tracing::info!(
                    function,
                    request_id = %self.request_id,
                    status_code = response.status_code,
                    "Sending response"
                );
                response
            }
            Err(error) => self.envelopes.error(&report_error(function, error.as_ref())),
        }
    }
}

pub fn envelope_builder(config: &AppConfig) -> EnvelopeBuilder {
    EnvelopeBuilder::new()
        .with_header(SERVICE_HEADER, config.service_name.clone())
        .with_header(STAGE_HEADER, config.stage.clone())
}

/// Decodes the event and logs its receipt.
pub(crate) fn decode_request(
    function: &str,
    context: &HttpContext<'_>,
    event: &serde_json::Value,
) -> Result<ApiRequest, ApiError> {
    let request = ApiRequest::from_event(event)?;
    tracing::info!(
        function,
        request_id = %context.request_id,
        method = %request.http_method,
        path = %request.path,
        "Received request"
    );
    Ok(request)
}

/// True when `request` is `method template`. Without an API Gateway resource
/// the raw path is matched segment by segment and `{param}` segments are
/// copied into the path parameters when the event did not carry them.
pub(crate) fn route_is(request: &mut ApiRequest, method: &str, template: &str) -> bool {
    if request.http_method != method {
        return false;
    }
    if let Some(resource) = &request.resource {
        return resource == template;
    }

    let Some(captured) = match_path(template, &request.path) else {
        return false;
    };
    for (name, value) in captured {
        request.path_parameters.entry(name).or_insert(value);
    }
    true
}

fn match_path(template: &str, path: &str) -> Option<Vec<(String, String)>> {
    let template_segments: Vec<&str> = template.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let mut captured = Vec::new();

    for (index, segment) in template_segments.iter().enumerate() {
        let param = segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'));
        match param {
            Some(greedy) if greedy.ends_with('+') => {
                let rest = path_segments.get(index..)?;
                if rest.is_empty() || rest.iter().all(|part| part.is_empty()) {
                    return None;
                }
                captured.push((greedy.trim_end_matches('+').to_string(), rest.join("/")));
                return Some(captured);
            }
            Some(name) => {
                let value = path_segments.get(index).filter(|value| !value.is_empty())?;
                captured.push((name.to_string(), value.to_string()));
            }
            None if path_segments.get(index) == Some(segment) => {}
            None => return None,
        }
    }

    (template_segments.len() == path_segments.len()).then_some(captured)
}

pub(crate) fn route_not_found(request: &ApiRequest) -> ApiError {
    ApiError::not_found("Route not found")
        .with_detail("method", request.http_method.clone())
        .with_detail("path", request.path.clone())
}
