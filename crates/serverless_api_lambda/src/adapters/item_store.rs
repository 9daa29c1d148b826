use async_trait::async_trait;
use serverless_api_core::contract::{Item, ItemPatch, NewItem};

use super::StoreError;

/// Key-value persistence for items, keyed by `id`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, item: NewItem) -> Result<Item, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// Applies `patch` and refreshes `updatedAt`. `NotFound` when `id` is absent.
    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<Item, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn scan_all(&self) -> Result<Vec<Item>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }
}
