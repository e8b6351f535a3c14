//! Custom extractors for request validation

use aide::operation::OperationInput;
use aide::{OperationIo, OperationOutput};
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
};
use http_body_util::LengthLimitError;

use crate::{
    form_data::{
        is_multipart_form_data, mime_type_from_extension, multipart_body_limit,
        parse_multipart_form, FormError,
    },
    types::{AppError, Environment},
};

/// Header naming the bucket every operation targets
pub const BUCKET_NAME_HEADER: &str = "x-bucket-name";
/// Header naming the object key for uploads and downloads
pub const FILE_KEY_HEADER: &str = "x-file-key";
/// Header carrying the key prefix for listings
pub const FILE_PATH_HEADER: &str = "x-file-path";

/// Reads a header as text, treating an empty or non-text value as absent
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Bucket name taken from the `x-bucket-name` header
#[derive(Debug, Clone, OperationIo)]
pub struct BucketName(pub String);

impl<S> FromRequestParts<S> for BucketName
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(&parts.headers, BUCKET_NAME_HEADER)
            .map(Self)
            .ok_or_else(|| {
                AppError::bad_request(
                    "Bucket name is required. Please provide x-bucket-name header.",
                )
            })
    }
}

/// Bucket name treated as part of the caller's authentication context
///
/// Unlike [`BucketName`], a missing header is rejected with 401.
#[derive(Debug, Clone, OperationIo)]
pub struct BucketContext(pub String);

impl<S> FromRequestParts<S> for BucketContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(&parts.headers, BUCKET_NAME_HEADER)
            .map(Self)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Authentication context incomplete. Bucket name required in x-bucket-name header.",
                )
            })
    }
}

/// Object key taken from the `x-file-key` header
#[derive(Debug, Clone, OperationIo)]
pub struct FileKey(pub String);

impl<S> FromRequestParts<S> for FileKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(&parts.headers, FILE_KEY_HEADER)
            .map(Self)
            .ok_or_else(|| {
                AppError::bad_request("File key not provided. Please specify x-file-key header.")
            })
    }
}

/// Optional listing prefix taken from the trimmed `x-file-path` header
#[derive(Debug, Clone, OperationIo)]
pub struct FilePrefix(pub Option<String>);

impl<S> FromRequestParts<S> for FilePrefix
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let prefix = header_value(&parts.headers, FILE_PATH_HEADER)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self(prefix))
    }
}

/// Classifies a failed body read: exceeding `limit` is an oversized upload,
/// anything else means the client stopped sending
fn body_read_error(err: axum::Error, limit: usize) -> FormError {
    let inner = err.into_inner();
    let exceeded = std::iter::successors(
        Some(inner.as_ref() as &(dyn std::error::Error + 'static)),
        |e| e.source(),
    )
    .any(|e| e.is::<LengthLimitError>());

    if exceeded {
        FormError::FileTooLarge { limit }
    } else {
        FormError::BodyRead(inner.to_string())
    }
}

/// File contents of an upload request, raw or multipart
#[derive(Debug, Clone)]
pub struct UploadBody {
    /// File contents
    pub data: Bytes,
    /// Declared or inferred content type
    pub content_type: Option<String>,
    /// File name from the multipart part, if the body was a form
    pub file_name: Option<String>,
}

impl<S> FromRequest<S> for UploadBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let max_upload_bytes = parts.extensions.get::<Environment>().map_or_else(
            || Environment::Production.max_upload_bytes(),
            Environment::max_upload_bytes,
        );

        let content_type = header_value(&parts.headers, CONTENT_TYPE.as_str());
        let is_multipart = content_type
            .as_deref()
            .is_some_and(is_multipart_form_data);

        // Multipart bodies may exceed the file limit by their framing; the file
        // itself is checked while parsing
        let body_limit = if is_multipart {
            multipart_body_limit(max_upload_bytes)
        } else {
            max_upload_bytes
        };

        // The whole body is consumed here, even when it is later rejected
        let body = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|e| body_read_error(e, max_upload_bytes))?;

        if !is_multipart {
            return Ok(Self {
                data: body,
                content_type,
                file_name: None,
            });
        }

        let request = Request::from_parts(parts, Body::from(body));
        let form = parse_multipart_form(request, max_upload_bytes).await?;
        let file = form.files.into_iter().next().ok_or(FormError::NoFile)?;

        let content_type = if file.content_type.is_empty() {
            mime_type_from_extension(&file.file_name).to_string()
        } else {
            file.content_type
        };

        Ok(Self {
            data: file.data,
            content_type: Some(content_type),
            file_name: Some(file.file_name),
        })
    }
}

impl OperationInput for UploadBody {
    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        // Document form parsing error responses
        AppError::inferred_responses(ctx, operation)
    }
}
