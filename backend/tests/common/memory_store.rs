use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use storage_backend::object_storage::{
    BucketInfo, FileInfo, ObjectStore, StorageError, StorageProvider, StorageResult,
    DEFAULT_BUCKET_REGION, DEFAULT_CONTENT_TYPE, MAX_LIST_KEYS,
};

/// Operations that can be made to fail on the in-memory backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    List,
    Upload,
    Presign,
    CreateBucket,
    HeadBucket,
    Cors,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryBucket {
    pub region: String,
    pub objects: BTreeMap<String, StoredObject>,
    pub cors_configurations: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    buckets: HashMap<String, MemoryBucket>,
    failures: HashSet<FailOn>,
    missing_credentials: bool,
    stores_built: usize,
    list_delay: Option<Duration>,
}

/// In-memory stand-in for the object storage backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorageProvider {
    pub fn add_bucket(&self, name: &str) {
        self.state.lock().unwrap().buckets.insert(
            name.to_string(),
            MemoryBucket {
                region: DEFAULT_BUCKET_REGION.to_string(),
                ..Default::default()
            },
        );
    }

    pub fn put_object(&self, bucket: &str, key: &str, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let bucket = state.buckets.get_mut(bucket).expect("bucket must exist");
        bucket.objects.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::copy_from_slice(data),
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                last_modified: Utc::now(),
            },
        );
    }

    pub fn fail_on(&self, operation: FailOn) {
        self.state.lock().unwrap().failures.insert(operation);
    }

    /// Makes every listing wait `delay` before answering
    pub fn delay_list(&self, delay: Duration) {
        self.state.lock().unwrap().list_delay = Some(delay);
    }

    pub fn without_credentials(&self) {
        self.state.lock().unwrap().missing_credentials = true;
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let state = self.state.lock().unwrap();
        state.buckets.get(bucket)?.objects.get(key).cloned()
    }

    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.buckets.get(bucket).map(|b| b.region.clone())
    }

    pub fn cors_configurations(&self, bucket: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.buckets.get(bucket).map_or(0, |b| b.cors_configurations)
    }

    pub fn stores_built(&self) -> usize {
        self.state.lock().unwrap().stores_built
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn for_bucket(&self, bucket_name: &str) -> StorageResult<Box<dyn ObjectStore>> {
        let mut state = self.state.lock().unwrap();
        if state.missing_credentials {
            return Err(StorageError::Config(
                "Missing required S3 configuration. Please set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables."
                    .to_string(),
            ));
        }
        state.stores_built += 1;

        Ok(Box::new(MemoryStore {
            bucket_name: bucket_name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryStore {
    bucket_name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    fn check(&self, operation: FailOn, err: fn(String) -> StorageError) -> StorageResult<()> {
        if self.state.lock().unwrap().failures.contains(&operation) {
            return Err(err("InternalError: injected failure".to_string()));
        }
        Ok(())
    }
}

fn e_tag(data: &[u8]) -> String {
    let checksum = data
        .iter()
        .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(u32::from(*byte)));
    format!("\"{checksum:08x}\"")
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn list_objects(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>> {
        self.check(FailOn::List, StorageError::ListObjects)?;

        let delay = self.state.lock().unwrap().list_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        let bucket = state.buckets.get(&self.bucket_name).ok_or_else(|| {
            StorageError::ListObjects("NoSuchBucket: The specified bucket does not exist".to_string())
        })?;

        Ok(bucket
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix.unwrap_or_default()))
            .take(MAX_LIST_KEYS as usize)
            .map(|(key, object)| FileInfo {
                key: key.clone(),
                e_tag: e_tag(&object.data),
                last_modified: object.last_modified,
                size: object.data.len() as u64,
            })
            .collect())
    }

    async fn upload_file(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<FileInfo> {
        self.check(FailOn::Upload, StorageError::UploadFile)?;

        let mut state = self.state.lock().unwrap();
        let bucket = state.buckets.get_mut(&self.bucket_name).ok_or_else(|| {
            StorageError::UploadFile("NoSuchBucket: The specified bucket does not exist".to_string())
        })?;

        let last_modified = Utc::now();
        let info = FileInfo {
            key: key.to_string(),
            e_tag: e_tag(&data),
            last_modified,
            size: data.len() as u64,
        };

        bucket.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
                last_modified,
            },
        );

        Ok(info)
    }

    async fn get_file(&self, key: &str) -> StorageResult<Bytes> {
        let state = self.state.lock().unwrap();
        state
            .buckets
            .get(&self.bucket_name)
            .and_then(|bucket| bucket.objects.get(key))
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.check(FailOn::Presign, StorageError::Presign)?;

        Ok(format!(
            "http://localhost:4566/{}/{key}?X-Amz-Expires={}&X-Amz-Signature=deadbeef",
            self.bucket_name,
            expires_in.as_secs()
        ))
    }

    async fn create_bucket(&self, name: &str, region: Option<&str>) -> StorageResult<BucketInfo> {
        self.check(FailOn::CreateBucket, StorageError::CreateBucket)?;

        let location = region.unwrap_or(DEFAULT_BUCKET_REGION).to_string();
        let mut state = self.state.lock().unwrap();
        if state.buckets.contains_key(name) {
            return Err(StorageError::CreateBucket(
                "BucketAlreadyOwnedByYou: Your previous request to create the named bucket succeeded"
                    .to_string(),
            ));
        }
        state.buckets.insert(
            name.to_string(),
            MemoryBucket {
                region: location.clone(),
                ..Default::default()
            },
        );

        Ok(BucketInfo {
            bucket: name.to_string(),
            location,
            exists: true,
            created: true,
            creation_date: Some(Utc::now()),
        })
    }

    async fn head_bucket(&self, name: &str) -> StorageResult<BucketInfo> {
        self.check(FailOn::HeadBucket, StorageError::HeadBucket)?;

        let state = self.state.lock().unwrap();
        Ok(match state.buckets.get(name) {
            Some(bucket) => BucketInfo {
                bucket: name.to_string(),
                location: bucket.region.clone(),
                exists: true,
                created: false,
                creation_date: None,
            },
            None => BucketInfo::missing(name),
        })
    }

    async fn bucket_location(&self, name: &str) -> StorageResult<String> {
        let state = self.state.lock().unwrap();
        state
            .buckets
            .get(name)
            .map(|bucket| bucket.region.clone())
            .ok_or_else(|| StorageError::BucketLocation("NoSuchBucket".to_string()))
    }

    async fn configure_bucket_cors(&self, name: &str) -> StorageResult<()> {
        self.check(FailOn::Cors, StorageError::ConfigureCors)?;

        let mut state = self.state.lock().unwrap();
        let bucket = state
            .buckets
            .get_mut(name)
            .ok_or_else(|| StorageError::ConfigureCors("NoSuchBucket".to_string()))?;
        bucket.cors_configurations += 1;
        Ok(())
    }
}
