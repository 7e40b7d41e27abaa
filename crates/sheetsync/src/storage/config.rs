//! Object store settings (`S3_*` environment variables)

use serde::{Deserialize, Serialize};
use std::env;

/// Region used when `S3_REGION` is unset.
pub const DEFAULT_S3_REGION: &str = "eu-west-1";

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Static credentials; the AWS default chain is used when absent
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_S3_REGION.to_string()),
            bucket: env::var("S3_BUCKET").unwrap_or_default(),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.trim().is_empty() {
            anyhow::bail!("S3_BUCKET must be set");
        }
        if self.region.trim().is_empty() {
            anyhow::bail!("S3_REGION cannot be empty");
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            anyhow::bail!("S3 access key and secret key must be set together");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn local_endpoint() -> StorageConfig {
        StorageConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            bucket: "public-sheets".to_string(),
            access_key: Some("sheetsync".to_string()),
            secret_key: Some("s3cr3t-value".to_string()),
            path_style: true,
        }
    }

    #[test]
    fn test_explicit_endpoint_validates() {
        assert!(local_endpoint().validate().is_ok());
    }

    #[test]
    fn test_half_credentials_rejected() {
        let mut config = local_endpoint();
        config.secret_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let printed = format!("{:?}", local_endpoint());
        assert!(!printed.contains("s3cr3t-value"));
        assert!(printed.contains("public-sheets"));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_bucket() {
        env::remove_var("S3_BUCKET");
        assert!(StorageConfig::from_env().is_err());

        env::set_var("S3_BUCKET", "public-sheets");
        env::remove_var("S3_REGION");
        let config = StorageConfig::from_env();
        env::remove_var("S3_BUCKET");

        let config = config.unwrap();
        assert_eq!(config.bucket, "public-sheets");
        assert_eq!(config.region, DEFAULT_S3_REGION);
    }
}
