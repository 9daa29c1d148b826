use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::storage_keys::percent_decode;

/// The parts of an API Gateway proxy event the handlers read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub http_method: String,
    pub path: String,
    pub resource: Option<String>,
    pub path_parameters: BTreeMap<String, String>,
    pub query_parameters: BTreeMap<String, String>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Accepts REST (v1) proxy events and falls back to HTTP API (v2)
    /// `rawPath` / `requestContext.http.method`.
    pub fn from_event(event: &Value) -> Result<Self, ApiError> {
        let Some(object) = event.as_object() else {
            return Err(ApiError::bad_request("Request payload must be a JSON object"));
        };

        let http_method = string_field(object, "httpMethod")
            .or_else(|| {
                event
                    .pointer("/requestContext/http/method")
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
            .to_ascii_uppercase();
        let path = string_field(object, "path")
            .or_else(|| string_field(object, "rawPath"))
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            http_method,
            path,
            resource: string_field(object, "resource").map(str::to_string),
            path_parameters: string_map(object.get("pathParameters")),
            query_parameters: string_map(object.get("queryStringParameters")),
            body: object.get("body").cloned(),
        })
    }

    /// Route template when API Gateway supplies one, otherwise the raw path.
    pub fn route(&self) -> &str {
        self.resource.as_deref().unwrap_or(&self.path)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Path parameter after URL decoding; malformed escapes are a bad request.
    pub fn decoded_path_param(&self, name: &str) -> Result<Option<String>, ApiError> {
        let Some(raw) = self.path_param(name) else {
            return Ok(None);
        };

        let decoded = percent_decode(raw).map_err(|error| {
            ApiError::bad_request(format!("{name} path parameter is not valid: {error}"))
                .with_detail(name, raw)
        })?;
        Ok(Some(decoded).filter(|value| !value.trim().is_empty()))
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Decoded JSON object body. Missing, null or empty bodies decode to `{}`.
    pub fn json_body(&self) -> Result<Value, ApiError> {
        let decoded = match &self.body {
            None | Some(Value::Null) => return Ok(Value::Object(Map::new())),
            Some(Value::String(text)) if text.trim().is_empty() => {
                return Ok(Value::Object(Map::new()))
            }
            Some(Value::String(text)) => serde_json::from_str::<Value>(text)
                .map_err(|_| ApiError::bad_request("Request body must be valid JSON"))?,
            Some(value) => value.clone(),
        };

        if decoded.is_object() {
            Ok(decoded)
        } else {
            Err(ApiError::bad_request("Request body must be a JSON object"))
        }
    }

    pub fn body_keys(&self) -> Vec<String> {
        match self.json_body() {
            Ok(Value::Object(fields)) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    object.get(name).and_then(Value::as_str)
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(fields)) = value else {
        return BTreeMap::new();
    };

    fields
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key.clone(), text.clone())),
            Value::Number(number) => Some((key.clone(), number.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn reads_rest_api_event_parts() {
        let request = ApiRequest::from_event(&json!({
            "httpMethod": "get",
            "path": "/files/report%20q1.pdf",
            "resource": "/files/{key}",
            "pathParameters": {"key": "report%20q1.pdf"},
            "queryStringParameters": {"prefix": "uploads/"},
            "body": null
        }))
        .expect("event should decode");

        assert_eq!(request.http_method, "GET");
        assert_eq!(request.route(), "/files/{key}");
        assert_eq!(request.query_param("prefix"), Some("uploads/"));
        assert_eq!(
            request
                .decoded_path_param("key")
                .expect("key should decode")
                .as_deref(),
            Some("report q1.pdf")
        );
        assert_eq!(request.json_body().expect("null body is empty"), json!({}));
    }

    #[test]
    fn falls_back_to_http_api_fields() {
        let request = ApiRequest::from_event(&json!({
            "rawPath": "/hello",
            "requestContext": {"http": {"method": "GET"}},
            "pathParameters": null
        }))
        .expect("event should decode");

        assert_eq!(request.http_method, "GET");
        assert_eq!(request.route(), "/hello");
        assert!(request.path_parameters.is_empty());
    }

    #[test]
    fn decodes_string_and_object_bodies() {
        let from_string = ApiRequest::from_event(&json!({"body": "{\"title\":\"a\"}"}))
            .expect("event should decode");
        let from_object =
            ApiRequest::from_event(&json!({"body": {"title": "a"}})).expect("event should decode");

        assert_eq!(from_string.json_body().expect("body should parse"), json!({"title": "a"}));
        assert_eq!(from_object.json_body().expect("body should parse"), json!({"title": "a"}));
        assert_eq!(from_string.body_keys(), vec!["title".to_string()]);
    }

    #[test]
    fn rejects_malformed_and_non_object_bodies() {
        let malformed =
            ApiRequest::from_event(&json!({"body": "{not json"})).expect("event should decode");
        let error = malformed.json_body().expect_err("malformed body should fail");
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), "Request body must be valid JSON");

        let array = ApiRequest::from_event(&json!({"body": "[1,2]"})).expect("event should decode");
        let error = array.json_body().expect_err("array body should fail");
        assert_eq!(error.message(), "Request body must be a JSON object");
    }

    #[test]
    fn rejects_non_object_events() {
        let error = ApiRequest::from_event(&json!("hello")).expect_err("string event should fail");
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn blank_path_parameters_count_as_missing() {
        let request = ApiRequest::from_event(&json!({"pathParameters": {"name": "  "}}))
            .expect("event should decode");
        assert_eq!(request.path_param("name"), None);
    }

    #[test]
    fn malformed_escapes_in_path_parameters_are_bad_requests() {
        let request = ApiRequest::from_event(&json!({"pathParameters": {"key": "bad%zz"}}))
            .expect("event should decode");

        let error = request
            .decoded_path_param("key")
            .expect_err("malformed escape should fail");
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.details()["key"], json!("bad%zz"));
    }
}
