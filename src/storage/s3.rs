// src/storage/s3.rs

//! AWS S3 storage backend.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::storage::ObjectStore;

/// S3-backed object store.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 store for the given bucket.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a store from validated configuration.
    ///
    /// Credentials are picked up from the environment through the SDK's
    /// default chain; [`Config::from_env`] has already verified they exist.
    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    AppError::storage(format!("s3://{}/{} not found", self.bucket, key))
                } else {
                    AppError::storage(format!("get s3://{}/{}: {}", self.bucket, key, service_err))
                }
            })?;

        let bytes = output.body.collect().await.map_err(|e| {
            AppError::storage(format!("read s3://{}/{}: {}", self.bucket, key, e))
        })?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::storage(format!(
                    "put s3://{}/{}: {}",
                    self.bucket,
                    key,
                    e.into_service_error()
                ))
            })?;

        Ok(())
    }
}
