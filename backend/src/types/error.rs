//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{form_data::FormError, object_storage::StorageError};

/// API operations named in server error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Ensure a bucket exists with the browser CORS policy
    EnsureBucket,
    /// List files in a bucket
    ListFiles,
    /// Upload one file
    UploadFile,
    /// Redirect to a presigned download URL
    DownloadFile,
}

impl Operation {
    /// Wire name of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnsureBucket => "ensure_bucket",
            Self::ListFiles => "files",
            Self::UploadFile => "files_upload",
            Self::DownloadFile => "files_download",
        }
    }
}

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Operation that failed, present on server errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<&'static str>,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, msg: impl Into<String>, operation: Option<Operation>) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                error: msg.into(),
                operation: operation.map(Operation::as_str),
            },
        }
    }

    /// Missing or malformed caller input
    #[must_use]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg, None)
    }

    /// Incomplete authentication context
    #[must_use]
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg, None)
    }

    /// Deployment configuration that prevents serving any request of this kind
    #[must_use]
    pub fn misconfigured(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg, None)
    }

    /// A storage failure while performing `operation`
    #[must_use]
    pub fn storage(operation: Operation, err: &StorageError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
            Some(operation),
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message carried in the response body
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {}", self.inner.error),
            500..=599 => tracing::error!(
                "Server error in {}: {}",
                self.inner.operation.unwrap_or("request"),
                self.inner.error
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert multipart parsing errors to application errors
impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::FileTooLarge { .. } => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string(), None)
            }
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
