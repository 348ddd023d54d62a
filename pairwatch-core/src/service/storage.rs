use bytes::Bytes;
use opendal::{services, Operator};
use std::sync::Arc;
use std::time::Duration;

use crate::{config::StorageConfig, Error, Result};

/// Object storage for videos and thumbnails
///
/// Serves objects either through a public URL prefix (CDN mode) or through
/// presigned GET URLs that expire.
#[derive(Clone)]
pub struct MediaStorage {
    operator: Arc<Operator>,
    public_url_prefix: Option<String>,
}

impl std::fmt::Debug for MediaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStorage")
            .field("scheme", &self.operator.info().scheme())
            .field("public_url_prefix", &self.public_url_prefix)
            .finish()
    }
}

impl MediaStorage {
    /// S3 when a bucket is configured, otherwise an in-process store
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let public_url_prefix = config.public_url_prefix.clone().filter(|p| !p.is_empty());

        if config.bucket.is_empty() {
            tracing::warn!("No storage bucket configured, using in-memory object store");
            return Self::memory(public_url_prefix);
        }

        tracing::info!(
            "Initializing S3 storage: bucket={}, region={}",
            config.bucket,
            config.region
        );

        let mut builder = services::S3::default()
            .bucket(&config.bucket)
            .region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if !config.access_key_id.is_empty() {
            builder = builder
                .access_key_id(&config.access_key_id)
                .secret_access_key(&config.secret_access_key);
        }

        let operator = Operator::new(builder)?.finish();

        Ok(Self {
            operator: Arc::new(operator),
            public_url_prefix,
        })
    }

    /// In-process store; only CDN-mode URLs can be issued from it
    pub fn memory(public_url_prefix: Option<String>) -> Result<Self> {
        let operator = Operator::new(services::Memory::default())?.finish();
        Ok(Self {
            operator: Arc::new(operator),
            public_url_prefix,
        })
    }

    /// Time-limited URL for reading `key`
    pub async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String> {
        if let Some(prefix) = &self.public_url_prefix {
            return Ok(format!("{prefix}{key}"));
        }

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| Error::Storage(format!("Failed to presign URL: {e}")))?;

        tracing::trace!(
            "Generated presigned URL for key '{}': expires in {}s",
            key,
            ttl.as_secs()
        );

        Ok(presigned.uri().to_string())
    }

    pub async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let size = data.len();
        let write = self.operator.write_with(key, data);
        // Not every backend stores a content type (the memory service does not)
        let write = if self.operator.info().full_capability().write_with_content_type {
            write.content_type(content_type)
        } else {
            write
        };
        write.await?;

        tracing::debug!("Stored object {} ({} bytes, {})", key, size, content_type);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.operator.delete(key).await?;
        tracing::debug!("Deleted object {}", key);
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.operator.exists(key).await?)
    }
}
