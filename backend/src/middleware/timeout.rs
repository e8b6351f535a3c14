//! Request timeout as a JSON error response

use axum::{http::StatusCode, BoxError};
use tower::timeout::error::Elapsed;

use crate::types::AppError;

/// Turns a failure of the timeout layer into an [`AppError`]
///
/// Runs inside the CORS middleware, so timed-out responses still carry the
/// allow-origin header.
#[allow(clippy::unused_async)]
pub async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out.", None)
    } else {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {err}"),
            None,
        )
    }
}
