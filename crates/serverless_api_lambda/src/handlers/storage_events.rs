use futures_util::future::join_all;
use serde_json::{json, Map, Value};
use serverless_api_core::contract::{
    now_iso8601, BatchSummary, DeletedObject, FailedObject, ProcessedObject, RecordFailure,
    RecordOutcome, StorageEvent, StorageEventKind, StorageEventRecord,
};
use serverless_api_core::errors::{report_error, ApiError};
use serverless_api_core::response::{EnvelopeBuilder, ResponseEnvelope};
use serverless_api_core::storage_keys::{decode_event_key, is_json_key};
use thiserror::Error;

use crate::adapters::object_store::ObjectStore;
use crate::adapters::StoreError;

const FUNCTION: &str = "storage_events";
pub const NO_RECORDS_MESSAGE: &str = "No records to process";
pub const PROCESSING_COMPLETE_MESSAGE: &str = "Processing complete";

/// Raised when the notification itself cannot be understood. Returned to
/// the runtime so the invocation is retried.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed storage event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Processes a storage notification batch. Records run concurrently and a
/// failing record is reported in its own result without stopping the rest.
pub async fn handle_storage_event(
    event: Value,
    store: &dyn ObjectStore,
    envelopes: &EnvelopeBuilder,
) -> Result<ResponseEnvelope, EventError> {
    let event: StorageEvent = serde_json::from_value(event).map_err(|error| {
        tracing::error!(function = FUNCTION, error_message = %error, "Malformed storage event");
        EventError::from(error)
    })?;
    tracing::info!(
        function = FUNCTION,
        record_count = event.records.len(),
        "Storage event received"
    );

    if event.records.is_empty() {
        return Ok(envelopes.build(
            200,
            json!({
                "message": NO_RECORDS_MESSAGE,
                "results": [],
            }),
        ));
    }

    let results = join_all(
        event
            .records
            .iter()
            .map(|record| process_record(record, store)),
    )
    .await;
    let summary = BatchSummary::new(PROCESSING_COMPLETE_MESSAGE, results);
    tracing::info!(
        function = FUNCTION,
        success_count = summary.success_count,
        error_count = summary.error_count,
        "Storage event processed"
    );

    Ok(envelopes.build(200, &summary))
}

async fn process_record(record: &StorageEventRecord, store: &dyn ObjectStore) -> RecordOutcome {
    let bucket = record.s3.bucket.name.clone();
    let key = match decode_event_key(&record.s3.object.key) {
        Ok(key) => key,
        Err(error) => {
            let failure = ApiError::bad_request(format!("Object key is not valid: {error}"))
                .with_detail("key", record.s3.object.key.clone());
            return failed(bucket, record.s3.object.key.clone(), &failure);
        }
    };
    tracing::info!(
        function = FUNCTION,
        bucket = %bucket,
        key = %key,
        event_name = %record.event_name,
        "Processing storage record"
    );

    match record.kind() {
        StorageEventKind::Removed => RecordOutcome::Deleted(DeletedObject {
            bucket,
            key,
            event_time: record.event_time.clone(),
            deleted_at: now_iso8601(),
        }),
        StorageEventKind::Created => match inspect_object(store, &bucket, &key).await {
            Ok(processed) => RecordOutcome::Success(processed),
            Err(error) => failed(bucket, key, &error),
        },
    }
}

async fn inspect_object(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<ProcessedObject, ApiError> {
    let metadata = store
        .head(bucket, key)
        .await
        .map_err(|error| not_found_as(error, key))?;

    let parsed_content = if is_json_key(key) {
        let bytes = store
            .read(bucket, key)
            .await
            .map_err(|error| not_found_as(error, key))?;
        serde_json::from_slice::<Value>(&bytes).map_err(|_| {
            ApiError::bad_request("Object content is not valid JSON").with_detail("key", key)
        })?
    } else {
        Value::Object(Map::new())
    };

    Ok(ProcessedObject {
        bucket: bucket.to_string(),
        key: key.to_string(),
        size: metadata.size,
        content_type: metadata.content_type,
        last_modified: metadata.last_modified,
        parsed_content,
        processed_at: now_iso8601(),
    })
}

fn not_found_as(error: StoreError, key: &str) -> ApiError {
    match error {
        StoreError::NotFound(_) => ApiError::not_found(format!("File not found: {key}")),
        other => ApiError::from(other),
    }
}

fn failed(bucket: String, key: String, error: &ApiError) -> RecordOutcome {
    let normalized = report_error(FUNCTION, error);
    RecordOutcome::Error(FailedObject {
        bucket,
        key,
        error: RecordFailure {
            code: normalized.body.error.code,
            message: normalized.body.error.message,
        },
    })
}
