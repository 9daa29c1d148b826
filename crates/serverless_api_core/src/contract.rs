use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ITEM_STATUS: &str = "active";

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl NewItem {
    /// Materializes the stored record, stamping both timestamps with `now`.
    pub fn into_item(self, now: &str) -> Item {
        Item {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self
                .status
                .filter(|status| !status.is_empty())
                .unwrap_or_else(|| DEFAULT_ITEM_STATUS.to_string()),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

/// Partial update. Empty `title`/`status` are ignored; `description` may be
/// cleared with an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ItemPatch {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|status| !status.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.title().is_none() && self.description().is_none() && self.status().is_none()
    }

    pub fn apply(&self, item: &mut Item, updated_at: &str) {
        if let Some(title) = self.title() {
            item.title = title.to_string();
        }
        if let Some(description) = self.description() {
            item.description = description.to_string();
        }
        if let Some(status) = self.status() {
            item.status = status.to_string();
        }
        item.updated_at = updated_at.to_string();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectListing {
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
}

/// Object-storage change notification as delivered to the function.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageEventRecord {
    pub event_name: String,
    #[serde(default)]
    pub event_time: Option<String>,
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageEntity {
    pub bucket: StorageBucket,
    pub object: StorageObject,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageBucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageObject {
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEventKind {
    Created,
    Removed,
}

impl StorageEventRecord {
    pub fn kind(&self) -> StorageEventKind {
        if self.event_name.starts_with("ObjectRemoved") {
            StorageEventKind::Removed
        } else {
            StorageEventKind::Created
        }
    }
}

/// Per-record result of a storage notification batch.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecordOutcome {
    Success(ProcessedObject),
    Error(FailedObject),
    Deleted(DeletedObject),
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Deleted(_))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub parsed_content: Value,
    pub processed_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailedObject {
    pub bucket: String,
    pub key: String,
    pub error: RecordFailure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordFailure {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedObject {
    pub bucket: String,
    pub key: String,
    pub event_time: Option<String>,
    pub deleted_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub message: String,
    pub results: Vec<RecordOutcome>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BatchSummary {
    pub fn new(message: impl Into<String>, results: Vec<RecordOutcome>) -> Self {
        let success_count = results.iter().filter(|result| result.is_success()).count();
        let error_count = results.len() - success_count;
        Self {
            message: message.into(),
            results,
            success_count,
            error_count,
        }
    }
}
