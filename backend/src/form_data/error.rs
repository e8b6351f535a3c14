//! Error types for form parsing

use thiserror::Error;

/// Errors that can occur while parsing an upload body
#[derive(Error, Debug)]
pub enum FormError {
    /// The content type carries no usable multipart boundary
    #[error("Form parsing error: {0}")]
    InvalidBoundary(String),

    /// The body ended before any multipart content was received
    #[error("Form parsing error: Unexpected end of form")]
    EmptyBody,

    /// The multipart stream is malformed or ended abruptly
    #[error("Form parsing error: {0}")]
    Malformed(String),

    /// A file part or raw body exceeds the configured size limit
    #[error("File upload error: file exceeds the maximum size of {limit} bytes")]
    FileTooLarge {
        /// Maximum accepted size in bytes
        limit: usize,
    },

    /// The request body could not be read to the end
    #[error("Upload error: request body ended unexpectedly: {0}")]
    BodyRead(String),

    /// A multipart body carried no file part
    #[error("No file provided in the request.")]
    NoFile,
}
