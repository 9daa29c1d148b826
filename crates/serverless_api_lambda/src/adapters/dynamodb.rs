use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use serverless_api_core::contract::{now_iso8601, Item, ItemPatch, NewItem};

use super::item_store::ItemStore;
use super::StoreError;

type Record = HashMap<String, AttributeValue>;

pub struct DynamoItemStore {
    client: Client,
    table_name: String,
}

impl DynamoItemStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(id: &str) -> (String, AttributeValue) {
        ("id".to_string(), AttributeValue::S(id.to_string()))
    }
}

#[async_trait]
impl ItemStore for DynamoItemStore {
    async fn create(&self, new_item: NewItem) -> Result<Item, StoreError> {
        let item = new_item.into_item(&now_iso8601());
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_record(&item)))
            .send()
            .await
            .map_err(|error| StoreError::backend(format!("failed to put item: {error}")))?;
        Ok(item)
    }

    async fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let (key_name, key_value) = Self::key(id);
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await
            .map_err(|error| StoreError::backend(format!("failed to get item: {error}")))?;

        output.item().map(record_to_item).transpose()
    }

    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<Item, StoreError> {
        let (key_name, key_value) = Self::key(id);
        let updated_at = now_iso8601();
        let mut assignments = Vec::new();
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .condition_expression("attribute_exists(id)")
            .return_values(ReturnValue::AllNew);

        let updates = [
            ("title", patch.title()),
            ("description", patch.description()),
            ("status", patch.status()),
            ("updatedAt", Some(updated_at.as_str())),
        ];
        for (attribute, value) in updates {
            let Some(value) = value else {
                continue;
            };
            assignments.push(format!("#{attribute} = :{attribute}"));
            request = request
                .expression_attribute_names(format!("#{attribute}"), attribute)
                .expression_attribute_values(
                    format!(":{attribute}"),
                    AttributeValue::S(value.to_string()),
                );
        }

        let output = request
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await
            .map_err(|error| {
                let missing = error
                    .as_service_error()
                    .is_some_and(|service| service.is_conditional_check_failed_exception());
                if missing {
                    StoreError::NotFound(format!("Item not found: {id}"))
                } else {
                    StoreError::backend(format!("failed to update item: {error}"))
                }
            })?;

        let attributes = output
            .attributes()
            .ok_or_else(|| StoreError::backend("update returned no attributes"))?;
        record_to_item(attributes)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let (key_name, key_value) = Self::key(id);
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::backend(format!("failed to delete item: {error}")))
    }

    async fn scan_all(&self) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut start_key: Option<Record> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|error| StoreError::backend(format!("failed to scan items: {error}")))?;

            for record in output.items() {
                items.push(record_to_item(record)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }
}

fn item_to_record(item: &Item) -> Record {
    [
        ("id", &item.id),
        ("title", &item.title),
        ("description", &item.description),
        ("status", &item.status),
        ("createdAt", &item.created_at),
        ("updatedAt", &item.updated_at),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), AttributeValue::S(value.clone())))
    .collect()
}

fn record_to_item(record: &Record) -> Result<Item, StoreError> {
    Ok(Item {
        id: required_string(record, "id")?,
        title: required_string(record, "title")?,
        description: optional_string(record, "description"),
        status: required_string(record, "status")?,
        created_at: required_string(record, "createdAt")?,
        updated_at: required_string(record, "updatedAt")?,
    })
}

fn required_string(record: &Record, name: &str) -> Result<String, StoreError> {
    record
        .get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::backend(format!("stored item is missing string attribute {name}")))
}

fn optional_string(record: &Record, name: &str) -> String {
    record
        .get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .unwrap_or_default()
}
