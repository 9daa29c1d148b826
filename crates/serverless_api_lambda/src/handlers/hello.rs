use std::time::Duration;

use serde_json::{json, Value};
use serverless_api_core::contract::now_iso8601;
use serverless_api_core::errors::ApiError;
use serverless_api_core::request::ApiRequest;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_core::validation::{
    coerce_number, string_field, validate_number, validate_schema, FieldSchema, NumberRules,
    StringRules,
};

use super::{decode_request, route_is, route_not_found, HandlerResult, HttpContext};

const FUNCTION: &str = "hello";
pub const HELLO_MESSAGE: &str = "Hello from Serverless Framework!";
pub const MAX_DELAY_MS: u64 = 5_000;

/// Greeting API: `GET /hello`, `GET /hello/{name}`, `POST /message`,
/// `GET /divide/{a}/{b}` and `GET /delay`.
pub async fn handle_hello_event(event: Value, context: &HttpContext<'_>) -> ResponseEnvelope {
    let result = route(&event, context).await;
    context.respond(FUNCTION, result)
}

async fn route(event: &Value, context: &HttpContext<'_>) -> HandlerResult {
    let mut request = decode_request(FUNCTION, context, event)?;

    if route_is(&mut request, "GET", "/hello") {
        say_hello(context)
    } else if route_is(&mut request, "GET", "/hello/{name}") {
        greet(&request, context)
    } else if route_is(&mut request, "POST", "/message") {
        create_message(&request, context)
    } else if route_is(&mut request, "GET", "/divide/{a}/{b}") {
        divide(&request, context)
    } else if route_is(&mut request, "GET", "/delay") {
        delay(&request, context).await
    } else {
        Err(route_not_found(&request).into())
    }
}

fn say_hello(context: &HttpContext<'_>) -> HandlerResult {
    Ok(context.envelopes.build(
        200,
        json!({
            "message": HELLO_MESSAGE,
            "timestamp": now_iso8601(),
            "stage": context.config.stage,
            "requestId": context.request_id,
        }),
    ))
}

fn greet(request: &ApiRequest, context: &HttpContext<'_>) -> HandlerResult {
    let name = request
        .decoded_path_param("name")?
        .ok_or_else(|| ApiError::bad_request("Name parameter is required"))?;

    Ok(context.envelopes.build(
        200,
        json!({
            "message": format!("Hello, {name}!"),
            "timestamp": now_iso8601(),
            "stage": context.config.stage,
            "requestId": context.request_id,
        }),
    ))
}

fn message_schema() -> FieldSchema {
    FieldSchema::new()
        .field(
            "message",
            string_field(StringRules::default().required().min_length(1).max_length(500)),
        )
        .field("author", string_field(StringRules::default().max_length(100)))
}

fn create_message(request: &ApiRequest, context: &HttpContext<'_>) -> HandlerResult {
    let body = request.json_body()?;
    tracing::info!(
        function = FUNCTION,
        request_id = %context.request_id,
        body_keys = ?request.body_keys(),
        "Creating message"
    );
    validate_schema(&body, &message_schema()).into_result()?;

    let author = body
        .get("author")
        .and_then(Value::as_str)
        .filter(|author| !author.trim().is_empty())
        .unwrap_or("Anonymous");

    Ok(context.envelopes.build(
        201,
        json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "message": body["message"],
            "author": author,
            "createdAt": now_iso8601(),
            "stage": context.config.stage,
        }),
    ))
}

fn divide(request: &ApiRequest, context: &HttpContext<'_>) -> HandlerResult {
    let operands = (
        request.path_param("a").and_then(parse_leading_int),
        request.path_param("b").and_then(parse_leading_int),
    );
    let (Some(a), Some(b)) = operands else {
        return Err(ApiError::bad_request("Both a and b must be valid numbers").into());
    };
    if b == 0 {
        return Err(ApiError::bad_request("Cannot divide by zero")
            .with_detail("a", a)
            .with_detail("b", b)
            .into());
    }

    Ok(context.envelopes.build(
        200,
        json!({
            "operation": "division",
            "a": a,
            "b": b,
            "result": a as f64 / b as f64,
            "timestamp": now_iso8601(),
            "stage": context.config.stage,
        }),
    ))
}

/// Base-10 integer prefix of `text` (`"12abc"` is 12), after leading
/// whitespace and an optional sign.
fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

async fn delay(request: &ApiRequest, context: &HttpContext<'_>) -> HandlerResult {
    let raw = request.query_param("ms").map(|ms| Value::String(ms.to_string()));
    let rules = NumberRules::default().min(0.0).max(MAX_DELAY_MS as f64);
    let validation = validate_number(raw.as_ref(), &rules);
    if let Some(error) = validation.error {
        return Err(ApiError::bad_request(error)
            .with_detail("field", "ms")
            .into());
    }

    let delayed_ms = raw
        .as_ref()
        .and_then(coerce_number)
        .map(|ms| ms.round() as u64)
        .unwrap_or(0);
    tokio::time::sleep(Duration::from_millis(delayed_ms)).await;

    Ok(context.envelopes.build(
        200,
        json!({
            "message": "Delay complete",
            "delayedMs": delayed_ms,
            "timestamp": now_iso8601(),
            "requestId": context.request_id,
        }),
    ))
}
