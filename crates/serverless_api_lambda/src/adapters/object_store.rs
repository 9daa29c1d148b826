use std::time::Duration;

use async_trait::async_trait;
use serverless_api_core::contract::{ObjectListing, ObjectMetadata};

use super::StoreError;

pub const LIST_PAGE_LIMIT: i32 = 100;

/// Object storage. Every call names its bucket; notifications may come from
/// buckets other than the configured one.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// First page (at most [`LIST_PAGE_LIMIT`] keys) under `prefix`.
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<ObjectListing, StoreError>;

    async fn upload_url(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;

    /// `NotFound` when the object does not exist.
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}
