//! Object store sink
//!
//! [`ObjectStore`] is the seam the publisher writes through. [`S3Storage`]
//! talks to S3 (or any S3-compatible endpoint); [`MemoryStore`] keeps objects
//! in memory for dry runs and tests.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use sha2::{Digest, Sha256};
use sheetsync_common::{Result, SyncError};
use tracing::{debug, info, instrument};

pub mod config;
pub mod memory;

pub use memory::MemoryStore;

/// One object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
    pub content_encoding: Option<String>,
}

/// What the store acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub key: String,
    pub checksum: String,
    pub size: usize,
}

impl PutReceipt {
    pub fn for_object(object: &PutObject) -> Self {
        Self {
            key: object.key.clone(),
            checksum: calculate_sha256(&object.body),
            size: object.body.len(),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one publicly readable object, replacing any previous version
    async fn put(&self, object: PutObject) -> Result<PutReceipt>;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Build the client once per process; it is shared read-only afterwards
    pub async fn new(config: config::StorageConfig) -> anyhow::Result<Self> {
        config.validate()?;
        debug!("Initializing storage with config: {:?}", config);

        let mut s3_config_builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "sheetsync-storage");
                aws_sdk_s3::Config::builder()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .credentials_provider(credentials)
            },
            _ => {
                let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        s3_config_builder = s3_config_builder
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    #[instrument(skip(self, object), fields(key = %object.key, size = object.body.len()))]
    async fn put(&self, object: PutObject) -> Result<PutReceipt> {
        let receipt = PutReceipt::for_object(&object);

        debug!(
            "Uploading {} bytes to s3://{}/{}",
            receipt.size, self.bucket, object.key
        );

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(&object.content_type)
            .cache_control(&object.cache_control)
            .content_length(receipt.size as i64)
            .body(ByteStream::from(object.body));

        if let Some(encoding) = &object.content_encoding {
            request = request.content_encoding(encoding);
        }

        request
            .send()
            .await
            .map_err(|e| SyncError::publish(&object.key, aws_sdk_s3::error::DisplayErrorContext(e)))?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, object.key);

        Ok(receipt)
    }
}

/// Calculate SHA256 checksum of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_sha256() {
        assert_eq!(
            calculate_sha256(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_receipt_for_object() {
        let object = PutObject {
            key: "sheets/status.txt".to_string(),
            body: b"hello world".to_vec(),
            content_type: "text/plain".to_string(),
            cache_control: "no-cache".to_string(),
            content_encoding: None,
        };

        let receipt = PutReceipt::for_object(&object);
        assert_eq!(receipt.key, "sheets/status.txt");
        assert_eq!(receipt.size, 11);
    }
}
