//! Object storage access for a single bucket
//!
//! [`ObjectStore`] is the seam between request handlers and the storage
//! backend. Handlers never hold a long-lived client: a [`StorageProvider`]
//! builds a fresh store bound to the caller's bucket on every request.

mod ensure;
mod error;
mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use ensure::ensure_bucket;
pub use error::{StorageError, StorageResult};
pub use s3::{S3Storage, S3StorageProvider, StorageConfig};

/// Region the storage service treats as its default
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// Maximum number of entries returned by a single listing
pub const MAX_LIST_KEYS: i32 = 1000;

/// Content type used when none is declared or inferable
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Identifier of the CORS rule written by [`ObjectStore::configure_bucket_cors`]
pub const CORS_RULE_ID: &str = "BrowserAccess";

/// Methods browsers may use against an ensured bucket
pub const CORS_ALLOWED_METHODS: [&str; 4] = ["GET", "PUT", "POST", "DELETE"];

/// Preflight cache lifetime of the bucket CORS rule
pub const CORS_MAX_AGE_SECS: i32 = 3000;

/// Metadata of one stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct FileInfo {
    /// Object key
    pub key: String,
    /// Checksum tag reported by the backend
    #[serde(rename = "ETag")]
    pub e_tag: String,
    /// Last modification time (ISO-8601 UTC)
    #[schemars(with = "String")]
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes
    pub size: u64,
}

/// Point-in-time snapshot of a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct BucketInfo {
    /// Bucket name
    pub bucket: String,
    /// Region the bucket lives in
    pub location: String,
    /// Whether the bucket exists
    pub exists: bool,
    /// Whether the bucket was created by this call
    pub created: bool,
    /// Creation time, only known for buckets created by this call
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[schemars(with = "Option<String>")]
    pub creation_date: Option<DateTime<Utc>>,
}

impl BucketInfo {
    /// Snapshot of a bucket the backend reports as absent
    #[must_use]
    pub fn missing(name: &str) -> Self {
        Self {
            bucket: name.to_string(),
            location: DEFAULT_BUCKET_REGION.to_string(),
            exists: false,
            created: false,
            creation_date: None,
        }
    }
}

/// Storage operations against one bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store is bound to
    fn bucket_name(&self) -> &str;

    /// Lists up to [`MAX_LIST_KEYS`] objects whose key starts with `prefix`
    ///
    /// Listings larger than one page are truncated.
    async fn list_objects(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>>;

    /// Writes an object and reads its metadata back
    async fn upload_file(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<FileInfo>;

    /// Reads an object fully into memory
    async fn get_file(&self, key: &str) -> StorageResult<Bytes>;

    /// Produces a time-limited download URL for `key`
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Creates `name`, constraining its location unless `region` is the default region
    async fn create_bucket(&self, name: &str, region: Option<&str>) -> StorageResult<BucketInfo>;

    /// Checks whether `name` exists; a missing bucket is reported as data, not an error
    async fn head_bucket(&self, name: &str) -> StorageResult<BucketInfo>;

    /// Region of `name`, the default region when the backend reports none
    async fn bucket_location(&self, name: &str) -> StorageResult<String>;

    /// Overwrites the CORS policy of `name` with the fixed browser-access policy
    async fn configure_bucket_cors(&self, name: &str) -> StorageResult<()>;
}

/// Builds an [`ObjectStore`] bound to a caller-supplied bucket
pub trait StorageProvider: Send + Sync {
    /// Creates a store for `bucket_name`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` when the deployment lacks the settings
    /// needed to reach the backend.
    fn for_bucket(&self, bucket_name: &str) -> StorageResult<Box<dyn ObjectStore>>;
}

/// Provider handle shared with request handlers
pub type SharedStorageProvider = Arc<dyn StorageProvider>;
