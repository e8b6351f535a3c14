//! Idempotent bucket provisioning

use tracing::{debug, info};

use super::{BucketInfo, ObjectStore, StorageError, StorageResult};

/// Ensures the store's bucket exists and carries the browser CORS policy
///
/// Checks for the bucket, creates it in `region` when absent, then always
/// rewrites the CORS policy so repeated calls reconcile the configuration.
/// Concurrent callers may both reach creation; the CORS step is safe to repeat.
///
/// # Errors
///
/// Returns `StorageError::EnsureBucket` wrapping the first failing step.
/// A bucket created before a CORS failure is not reported separately.
pub async fn ensure_bucket(store: &dyn ObjectStore, region: Option<&str>) -> StorageResult<BucketInfo> {
    let bucket_name = store.bucket_name();
    let wrap = |e: StorageError| StorageError::EnsureBucket(Box::new(e));

    let existing = store.head_bucket(bucket_name).await.map_err(wrap)?;

    let bucket_info = if existing.exists {
        debug!("Bucket {bucket_name} already exists in {}", existing.location);
        existing
    } else {
        info!("Bucket {bucket_name} not found, creating it");
        store
            .create_bucket(bucket_name, region)
            .await
            .map_err(wrap)?
    };

    store
        .configure_bucket_cors(bucket_name)
        .await
        .map_err(wrap)?;

    Ok(bucket_info)
}
