use axum::{Extension, Json};
use tracing::{info, instrument};

use crate::{
    object_storage::{self, BucketInfo, SharedStorageProvider},
    types::{AppError, BucketName, Environment, Operation},
};

/// Ensures a bucket exists and carries the browser CORS policy
///
/// Creates the bucket named by `x-bucket-name` in the deployment's configured
/// region when it does not exist yet, then rewrites its CORS policy whether or
/// not it existed. Calling this repeatedly is safe.
///
/// # Errors
///
/// - 400 when `x-bucket-name` is missing
/// - 500 when `AWS_REGION` is not configured
/// - 500 with operation `ensure_bucket` when any storage step fails
#[instrument(skip(environment, storage_provider))]
pub async fn ensure_bucket(
    Extension(environment): Extension<Environment>,
    Extension(storage_provider): Extension<SharedStorageProvider>,
    BucketName(bucket_name): BucketName,
) -> Result<Json<BucketInfo>, AppError> {
    let region = environment.aws_region().ok_or_else(|| {
        AppError::misconfigured("AWS_REGION environment variable is not configured.")
    })?;

    info!("Ensuring bucket: {bucket_name} in region: {region}");

    let store = storage_provider
        .for_bucket(&bucket_name)
        .map_err(|e| AppError::storage(Operation::EnsureBucket, &e))?;

    let bucket_info = object_storage::ensure_bucket(store.as_ref(), Some(&region))
        .await
        .map_err(|e| AppError::storage(Operation::EnsureBucket, &e))?;

    info!(
        "Bucket ensured successfully: {bucket_name} (created: {})",
        bucket_info.created
    );

    Ok(Json(bucket_info))
}
