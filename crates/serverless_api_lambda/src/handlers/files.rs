use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use serverless_api_core::errors::ApiError;
use serverless_api_core::request::ApiRequest;
use serverless_api_core::response::ResponseEnvelope;
use serverless_api_core::storage_keys::{prefix_label, upload_object_key};
use serverless_api_core::validation::{
    coerce_number, number_field, string_field, validate_schema, FieldSchema, NumberRules,
    StringRules,
};

use super::{decode_request, route_is, route_not_found, HandlerResult, HttpContext};
use crate::adapters::object_store::ObjectStore;
use crate::adapters::StoreError;

const FUNCTION: &str = "files";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;
pub const MISSING_KEY_MESSAGE: &str = "key path parameter is required";

/// Files API: listing, presigned upload/download URLs and deletion.
pub async fn handle_files_event(
    event: Value,
    context: &HttpContext<'_>,
    store: &dyn ObjectStore,
) -> ResponseEnvelope {
    let result = route(&event, context, store).await;
    context.respond(FUNCTION, result)
}

async fn route(event: &Value, context: &HttpContext<'_>, store: &dyn ObjectStore) -> HandlerResult {
    let mut request = decode_request(FUNCTION, context, event)?;
    let bucket = context.config.require_bucket()?;

    if route_is(&mut request, "GET", "/files") {
        list_files(&request, context, store, bucket).await
    } else if route_is(&mut request, "POST", "/files/upload") {
        create_upload_url(&request, context, store, bucket).await
    } else if is_file_route(&mut request, "GET") {
        create_download_url(&request, context, store, bucket).await
    } else if is_file_route(&mut request, "DELETE") {
        delete_file(&request, context, store, bucket).await
    } else {
        Err(route_not_found(&request).into())
    }
}

// REST events name the `/files/{key}` resource. Raw HTTP API paths carry the
// key unescaped, so its slashes are taken greedily.
fn is_file_route(request: &mut ApiRequest, method: &str) -> bool {
    route_is(request, method, "/files/{key}") || route_is(request, method, "/files/{key+}")
}

async fn list_files(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ObjectStore,
    bucket: &str,
) -> HandlerResult {
    let prefix = request.query_param("prefix");
    let listing = store.list(bucket, prefix).await.map_err(ApiError::from)?;

    Ok(context.envelopes.build(
        200,
        json!({
            "bucket": bucket,
            "fileCount": listing.objects.len(),
            "files": listing.objects,
            "prefix": prefix_label(prefix),
            "isTruncated": listing.is_truncated,
        }),
    ))
}

fn upload_schema() -> FieldSchema {
    FieldSchema::new()
        .field(
            "fileName",
            string_field(StringRules::default().required().min_length(1).max_length(255)),
        )
        .field("contentType", string_field(StringRules::default().max_length(255)))
        .field(
            "expirationTime",
            number_field(
                NumberRules::default()
                    .min(1.0)
                    .max(MAX_PRESIGN_EXPIRY_SECS as f64),
            ),
        )
}

async fn create_upload_url(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ObjectStore,
    bucket: &str,
) -> HandlerResult {
    let body = request.json_body()?;
    validate_schema(&body, &upload_schema()).into_result()?;

    let file_name = body
        .get("fileName")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let content_type = body
        .get("contentType")
        .and_then(Value::as_str)
        .filter(|content_type| !content_type.trim().is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let expires_in = body
        .get("expirationTime")
        .filter(|value| !value.is_null())
        .and_then(coerce_number)
        .map(|seconds| seconds.round() as u64)
        .unwrap_or(context.config.signed_url_expiry_secs);

    let key = upload_object_key(file_name, Utc::now().timestamp_millis());
    let upload_url = store
        .upload_url(bucket, &key, content_type, Duration::from_secs(expires_in))
        .await
        .map_err(ApiError::from)?;
    tracing::info!(function = FUNCTION, bucket, key = %key, expires_in, "Upload URL issued");

    Ok(context.envelopes.build(
        200,
        json!({
            "uploadUrl": upload_url,
            "bucket": bucket,
            "key": key,
            "expiresIn": expires_in,
            "instructions": "Use PUT request with the uploadUrl to upload file",
        }),
    ))
}

fn object_key(request: &ApiRequest) -> Result<String, ApiError> {
    request
        .decoded_path_param("key")?
        .ok_or_else(|| ApiError::bad_request(MISSING_KEY_MESSAGE))
}

async fn create_download_url(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ObjectStore,
    bucket: &str,
) -> HandlerResult {
    let key = object_key(request)?;
    store.head(bucket, &key).await.map_err(|error| match error {
        StoreError::NotFound(_) => {
            ApiError::not_found(format!("File not found: {key}")).with_detail("key", key.clone())
        }
        other => ApiError::from(other),
    })?;

    let expires_in = context.config.signed_url_expiry_secs;
    let download_url = store
        .download_url(bucket, &key, Duration::from_secs(expires_in))
        .await
        .map_err(ApiError::from)?;

    Ok(context.envelopes.build(
        200,
        json!({
            "downloadUrl": download_url,
            "bucket": bucket,
            "key": key,
            "expiresIn": expires_in,
            "instructions": "Use GET request with the downloadUrl to download file",
        }),
    ))
}

async fn delete_file(
    request: &ApiRequest,
    context: &HttpContext<'_>,
    store: &dyn ObjectStore,
    bucket: &str,
) -> HandlerResult {
    let key = object_key(request)?;
    store.delete(bucket, &key).await.map_err(ApiError::from)?;
    tracing::info!(function = FUNCTION, bucket, key = %key, "File deleted");

    Ok(context.envelopes.build(
        200,
        json!({
            "message": "File deleted successfully",
            "bucket": bucket,
            "key": key,
        }),
    ))
}
