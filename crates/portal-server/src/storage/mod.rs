//! Blob store for audit copies of uploaded files
//!
//! Every ingested CSV is archived under `uploads/<category>/<filename>` before
//! it is parsed. The archive is write-only from the portal's point of view.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::Region,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use portal_common::checksum::sha256_hex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

pub mod config;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Failed to store s3://{bucket}/{key}: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to provision bucket {bucket}: {message}")]
    Provision { bucket: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

/// Durable object storage keyed by path
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadResult, BlobError>;
}

/// Archive key for an uploaded file, e.g. `uploads/results/term1.csv`.
///
/// Only the final path component of `filename` is kept.
pub fn upload_key(category: &str, filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("upload.csv");
    format!("uploads/{}/{}", category, name)
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: config::StorageConfig) -> Self {
        debug!("Initializing storage with config: {:?}", config);

        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "portal-storage",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!("Storage client initialized for bucket: {}", config.bucket);

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
            region: config.region,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the bucket unless it already exists
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(&self) -> Result<(), BlobError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            debug!("Bucket already exists");
            return Ok(());
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        // us-east-1 rejects an explicit location constraint
        if self.region != config::DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| BlobError::Provision {
            bucket: self.bucket.clone(),
            message: e.to_string(),
        })?;

        info!("Created bucket");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self, data))]
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadResult, BlobError> {
        let checksum = sha256_hex(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| BlobError::Upload {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            message: e.to_string(),
        })?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }
}

/// In-process blob store for tests and local runs
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<UploadResult, BlobError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BlobError::Upload {
                bucket: "memory".to_string(),
                key: key.to_string(),
                message: "blob store unavailable".to_string(),
            });
        }

        let result = UploadResult {
            key: key.to_string(),
            checksum: sha256_hex(&data),
            size: data.len() as i64,
        };
        self.objects.write().await.insert(key.to_string(), data);
        Ok(result)
    }
}
