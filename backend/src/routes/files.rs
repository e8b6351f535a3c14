use std::time::Duration;

use aide::OperationOutput;
use axum::{
    http::{
        header::{CONTENT_TYPE, LOCATION},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{debug, info, instrument};

use crate::{
    form_data::mime_type_from_extension,
    object_storage::{FileInfo, SharedStorageProvider},
    types::{
        AppError, BucketContext, BucketName, Environment, FileKey, FilePrefix, Operation,
        UploadBody,
    },
};

/// Lists the files in a bucket
///
/// Returns at most 1000 entries whose key starts with `x-file-path`; without a
/// prefix the whole bucket is listed. Larger listings are truncated.
///
/// # Errors
///
/// - 401 when `x-bucket-name` is missing
/// - 500 with operation `files` when the listing fails
#[instrument(skip(storage_provider))]
pub async fn list_files(
    Extension(storage_provider): Extension<SharedStorageProvider>,
    BucketContext(bucket_name): BucketContext,
    FilePrefix(prefix): FilePrefix,
) -> Result<Json<Vec<FileInfo>>, AppError> {
    info!(
        "Listing files with prefix: {:?}, bucket: {bucket_name}",
        prefix.as_deref().unwrap_or_default()
    );

    let store = storage_provider
        .for_bucket(&bucket_name)
        .map_err(|e| AppError::storage(Operation::ListFiles, &e))?;

    let files = store
        .list_objects(prefix.as_deref())
        .await
        .map_err(|e| AppError::storage(Operation::ListFiles, &e))?;

    info!("Found {} files", files.len());

    Ok(Json(files))
}

/// Uploads one file under `x-file-key`
///
/// The body is either the raw file or a `multipart/form-data` form whose first
/// file part is stored. The stored content type is the declared one, falling
/// back to a type inferred from the file name.
///
/// # Errors
///
/// - 400 when `x-file-key` or `x-bucket-name` is missing, the form is
///   malformed or carries no file
/// - 413 when the file exceeds the upload limit
/// - 500 with operation `files_upload` when the upload fails
#[instrument(skip(storage_provider, upload))]
pub async fn upload_file(
    Extension(storage_provider): Extension<SharedStorageProvider>,
    FileKey(file_key): FileKey,
    BucketName(bucket_name): BucketName,
    upload: UploadBody,
) -> Result<Json<FileInfo>, AppError> {
    let content_type = upload
        .content_type
        .unwrap_or_else(|| mime_type_from_extension(&file_key).to_string());

    info!(
        "Uploading file: {file_key}, size: {} bytes, type: {content_type}, bucket: {bucket_name}",
        upload.data.len()
    );
    if let Some(file_name) = &upload.file_name {
        debug!("Multipart upload file name: {file_name}");
    }

    let store = storage_provider
        .for_bucket(&bucket_name)
        .map_err(|e| AppError::storage(Operation::UploadFile, &e))?;

    let file_info = store
        .upload_file(&file_key, upload.data, Some(&content_type))
        .await
        .map_err(|e| AppError::storage(Operation::UploadFile, &e))?;

    info!("File uploaded successfully: {file_key}");

    Ok(Json(file_info))
}

/// `303 See Other` pointing at a presigned download URL
#[derive(Debug)]
pub struct PresignedRedirect {
    location: HeaderValue,
}

impl IntoResponse for PresignedRedirect {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [
                (LOCATION, self.location),
                (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            ],
        )
            .into_response()
    }
}

impl OperationOutput for PresignedRedirect {
    type Inner = ();
}

/// Redirects to a time-limited download URL for `x-file-key`
///
/// The file content never passes through this service; clients follow the
/// `Location` header straight to the storage backend.
///
/// # Errors
///
/// - 400 when `x-file-key` or `x-bucket-name` is missing
/// - 500 with operation `files_download` when presigning fails
#[instrument(skip(environment, storage_provider))]
pub async fn download_file(
    Extension(environment): Extension<Environment>,
    Extension(storage_provider): Extension<SharedStorageProvider>,
    FileKey(file_key): FileKey,
    BucketName(bucket_name): BucketName,
) -> Result<PresignedRedirect, AppError> {
    info!("Generating download URL for file: {file_key}, bucket: {bucket_name}");

    let store = storage_provider
        .for_bucket(&bucket_name)
        .map_err(|e| AppError::storage(Operation::DownloadFile, &e))?;

    let expires_in = Duration::from_secs(environment.presigned_url_expiry_secs());
    let presigned_url = store
        .presigned_url(&file_key, expires_in)
        .await
        .map_err(|e| AppError::storage(Operation::DownloadFile, &e))?;

    let location = HeaderValue::try_from(presigned_url).map_err(|e| {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to generate presigned URL: {e}"),
            Some(Operation::DownloadFile),
        )
    })?;

    info!("Presigned URL generated for file: {file_key}");

    Ok(PresignedRedirect { location })
}
