//! Error types for object storage operations

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Result type for object storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during object storage operations
///
/// Every backend failure is tagged with the operation that produced it, so the
/// message surfaced to callers always starts with what was being attempted.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Client configuration is incomplete (credentials, bucket name)
    #[error("{0}")]
    Config(String),

    /// Listing objects failed
    #[error("Failed to list objects: {0}")]
    ListObjects(String),

    /// Writing or reading back an uploaded object failed
    #[error("Failed to upload file: {0}")]
    UploadFile(String),

    /// Reading an object failed
    #[error("Failed to get file: {0}")]
    GetFile(String),

    /// The backend returned no content for the requested key
    #[error("Failed to get file: File not found or empty: {0}")]
    NotFound(String),

    /// Presigning a download URL failed
    #[error("Failed to generate presigned URL: {0}")]
    Presign(String),

    /// Creating a bucket failed
    #[error("Failed to create bucket: {0}")]
    CreateBucket(String),

    /// Checking bucket existence failed for a reason other than not-found
    #[error("Failed to check bucket: {0}")]
    HeadBucket(String),

    /// Resolving the bucket's region failed
    #[error("Failed to get bucket location: {0}")]
    BucketLocation(String),

    /// Applying the bucket CORS policy failed
    #[error("Failed to configure CORS: {0}")]
    ConfigureCors(String),

    /// One step of the ensure-bucket sequence failed
    #[error("Failed to ensure bucket: {0}")]
    EnsureBucket(Box<StorageError>),
}

/// Renders an SDK error including the service's own message and error code
pub(crate) fn sdk_message<E, R>(error: &SdkError<E, R>) -> String
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    DisplayErrorContext(error).to_string()
}
