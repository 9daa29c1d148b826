use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::{DateTime, DateTimeFormat};
use aws_sdk_s3::Client;
use serverless_api_core::contract::{ObjectListing, ObjectMetadata, ObjectSummary};

use super::object_store::{ObjectStore, LIST_PAGE_LIMIT};
use super::StoreError;
use crate::config::AppConfig;

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Applies the bucket region and, for local emulators, a path-style
    /// endpoint override on top of the shared SDK configuration.
    pub fn from_config(sdk_config: &SdkConfig, config: &AppConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(region) = &config.bucket_region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.s3_local_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<ObjectListing, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(LIST_PAGE_LIMIT)
            .set_prefix(prefix.map(str::to_string))
            .send()
            .await
            .map_err(|error| StoreError::backend(format!("failed to list objects: {error}")))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_string(),
                    size: object.size().unwrap_or_default().max(0) as u64,
                    last_modified: object.last_modified().and_then(format_timestamp),
                })
            })
            .collect();

        Ok(ObjectListing {
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn upload_url(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning(expires_in)?)
            .await
            .map_err(|error| StoreError::backend(format!("failed to presign upload: {error}")))?;
        Ok(request.uri().to_string())
    }

    async fn download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning(expires_in)?)
            .await
            .map_err(|error| StoreError::backend(format!("failed to presign download: {error}")))?;
        Ok(request.uri().to_string())
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found())
                {
                    StoreError::NotFound(format!("File not found: {key}"))
                } else {
                    StoreError::backend(format!("failed to head object: {error}"))
                }
            })?;

        Ok(ObjectMetadata {
            size: output.content_length().unwrap_or_default().max(0) as u64,
            content_type: output.content_type().map(str::to_string),
            last_modified: output.last_modified().and_then(format_timestamp),
        })
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    StoreError::NotFound(format!("File not found: {key}"))
                } else {
                    StoreError::backend(format!("failed to get object: {error}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|error| StoreError::backend(format!("failed to read object body: {error}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::backend(format!("failed to delete object: {error}")))
    }
}

fn presigning(expires_in: Duration) -> Result<PresigningConfig, StoreError> {
    PresigningConfig::expires_in(expires_in)
        .map_err(|error| StoreError::backend(format!("invalid presigning expiry: {error}")))
}

fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    timestamp.fmt(DateTimeFormat::DateTime).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_as_rfc3339() {
        let timestamp = DateTime::from_secs(1_767_225_600);
        assert_eq!(
            format_timestamp(&timestamp).as_deref(),
            Some("2026-01-01T00:00:00Z")
        );
    }

    #[test]
    fn presigning_rejects_expiries_beyond_a_week() {
        assert!(presigning(Duration::from_secs(3600)).is_ok());
        assert!(matches!(
            presigning(Duration::from_secs(604_801)),
            Err(StoreError::Backend(_))
        ));
    }
}
