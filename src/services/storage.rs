//! Object storage for files attached to registrations

use opendal::{services, Operator};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::config::{StorageBackend, StorageConfig};
use crate::utils::errors::{CampusEventsError, Result};

/// Location of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

#[derive(Clone)]
pub struct FileStorage {
    operator: Operator,
    public_base_url: String,
}

impl FileStorage {
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let operator = match config.backend {
            StorageBackend::S3 => {
                let access_key_id = config
                    .access_key_id
                    .as_deref()
                    .ok_or_else(|| CampusEventsError::Config("storage.access_key_id is required for s3".to_string()))?;
                let secret_access_key = config
                    .secret_access_key
                    .as_deref()
                    .ok_or_else(|| CampusEventsError::Config("storage.secret_access_key is required for s3".to_string()))?;

                let mut builder = services::S3::default()
                    .bucket(&config.bucket)
                    .region(&config.region)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key);
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder)?.finish()
            }
            StorageBackend::Memory => Operator::new(services::Memory::default())?.finish(),
        };

        info!(backend = ?config.backend, bucket = %config.bucket, "Object storage initialized");
        Ok(Self::with_operator(operator, &config.public_base_url))
    }

    pub fn with_operator(operator: Operator, public_base_url: &str) -> Self {
        Self {
            operator,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// In-memory storage for tests and local development
    pub fn in_memory(public_base_url: &str) -> Result<Self> {
        let operator = Operator::new(services::Memory::default())?.finish();
        Ok(Self::with_operator(operator, public_base_url))
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    pub async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<StoredFile> {
        match content_type {
            Some(content_type) => {
                self.operator.write_with(key, data).content_type(content_type).await?;
            }
            None => {
                self.operator.write(key, data).await?;
            }
        }

        Ok(StoredFile {
            path: key.to_string(),
            url: self.public_url(key),
        })
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        Ok(self.operator.read(key).await?.to_vec())
    }
}
