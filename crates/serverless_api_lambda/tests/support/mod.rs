#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use serverless_api_core::contract::{
    now_iso8601, Item, ItemPatch, NewItem, ObjectListing, ObjectMetadata, ObjectSummary,
};
use serverless_api_lambda::adapters::item_store::ItemStore;
use serverless_api_lambda::adapters::object_store::ObjectStore;
use serverless_api_lambda::adapters::StoreError;
use serverless_api_lambda::config::AppConfig;

pub fn test_config() -> AppConfig {
    AppConfig {
        stage: "test".to_string(),
        environment: "test".to_string(),
        service_name: "serverless-api-test".to_string(),
        items_table: Some("items-test".to_string()),
        bucket_name: Some("files-test".to_string()),
        ..AppConfig::default()
    }
}

/// REST API proxy event with a resource template.
pub fn api_event(method: &str, resource: &str, path: &str) -> Value {
    json!({
        "httpMethod": method,
        "resource": resource,
        "path": path,
        "pathParameters": null,
        "queryStringParameters": null,
        "body": null
    })
}

pub fn with_path_params(mut event: Value, params: Value) -> Value {
    event["pathParameters"] = params;
    event
}

pub fn with_query(mut event: Value, query: Value) -> Value {
    event["queryStringParameters"] = query;
    event
}

pub fn with_body(mut event: Value, body: Value) -> Value {
    event["body"] = Value::String(body.to_string());
    event
}

#[derive(Default)]
pub struct InMemoryItemStore {
    items: Mutex<BTreeMap<String, Item>>,
    fail_with: Mutex<Option<String>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: Item) {
        self.items
            .lock()
            .expect("poisoned mutex")
            .insert(item.id.clone(), item);
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        self.items.lock().expect("poisoned mutex").get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("poisoned mutex").len()
    }

    /// Makes every later call fail with a backend error.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().expect("poisoned mutex") = Some(message.to_string());
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.fail_with.lock().expect("poisoned mutex").as_ref() {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn create(&self, item: NewItem) -> Result<Item, StoreError> {
        self.check()?;
        let item = item.into_item(&now_iso8601());
        self.insert(item.clone());
        Ok(item)
    }

    async fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        self.check()?;
        Ok(self.item(id))
    }

    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<Item, StoreError> {
        self.check()?;
        let mut items = self.items.lock().expect("poisoned mutex");
        let item = items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Item not found: {id}")))?;
        patch.apply(item, &now_iso8601());
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.items.lock().expect("poisoned mutex").remove(id);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Item>, StoreError> {
        self.check()?;
        Ok(self
            .items
            .lock()
            .expect("poisoned mutex")
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Object store keyed by `(bucket, key)`. Keys listed in `failing_keys`
/// answer every call with a backend error.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing_keys: Mutex<BTreeSet<String>>,
    deleted: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, body: &[u8], content_type: Option<&str>) {
        self.objects.lock().expect("poisoned mutex").insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn fail_key(&self, key: &str) {
        self.failing_keys
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string());
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_keys.lock().expect("poisoned mutex").contains(key) {
            return Err(StoreError::Backend(format!("access denied for {key}")));
        }
        Ok(())
    }

    fn object(&self, bucket: &str, key: &str) -> Result<StoredObject, StoreError> {
        self.check(key)?;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("File not found: {key}")))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<ObjectListing, StoreError> {
        let objects = self.objects.lock().expect("poisoned mutex");
        let matching: Vec<ObjectSummary> = objects
            .iter()
            .filter(|((object_bucket, key), _)| {
                object_bucket == bucket && prefix.map_or(true, |prefix| key.starts_with(prefix))
            })
            .map(|((_, key), object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: None,
            })
            .collect();

        let limit = serverless_api_lambda::adapters::object_store::LIST_PAGE_LIMIT as usize;
        Ok(ObjectListing {
            is_truncated: matching.len() > limit,
            objects: matching.into_iter().take(limit).collect(),
        })
    }

    async fn upload_url(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        self.check(key)?;
        Ok(format!(
            "https://{bucket}.example.test/{key}?op=put&content-type={content_type}&expires={}",
            expires_in.as_secs()
        ))
    }

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        self.check(key)?;
        Ok(format!(
            "https://{bucket}.example.test/{key}?op=get&expires={}",
            expires_in.as_secs()
        ))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let object = self.object(bucket, key)?;
        Ok(ObjectMetadata {
            size: object.body.len() as u64,
            content_type: object.content_type,
            last_modified: Some("2026-01-01T00:00:00Z".to_string()),
        })
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self.object(bucket, key)?.body)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .remove(&(bucket.to_string(), key.to_string()));
        self.deleted
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());
        Ok(())
    }
}
