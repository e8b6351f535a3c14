//! Multipart form handling for uploads

mod error;

use std::collections::HashMap;

use axum::{
    body::{Bytes, HttpBody},
    extract::{FromRequest, Multipart, Request},
};
use mime::Mime;
use tracing::debug;

pub use error::FormError;

use crate::object_storage::DEFAULT_CONTENT_TYPE;

/// Maximum number of files accepted per form; further file parts are drained and ignored
pub const MAX_FORM_FILES: usize = 1;

/// Room left for boundaries, part headers and text fields on top of the file limit
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest multipart body that can still carry a file of `max_file_bytes`
#[must_use]
pub const fn multipart_body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes.saturating_add(FORM_OVERHEAD_BYTES)
}

/// One file part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Name of the form field carrying the file
    pub field_name: String,
    /// Client-supplied file name, `unknown` when absent
    pub file_name: String,
    /// Declared content type of the part, empty when the part declares none
    pub content_type: String,
    /// File contents
    pub data: Bytes,
}

/// Structured contents of a multipart body
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedFormData {
    /// File parts in arrival order, at most [`MAX_FORM_FILES`]
    pub files: Vec<ParsedFile>,
    /// Text fields; a repeated name keeps its last value
    pub fields: HashMap<String, String>,
}

/// Whether `content_type` declares a `multipart/form-data` body
#[must_use]
pub fn is_multipart_form_data(content_type: &str) -> bool {
    content_type
        .parse::<Mime>()
        .is_ok_and(|mime| mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA)
}

/// Parses a multipart request whose body the caller has already buffered
///
/// The request keeps its original extensions so axum's body limit settings
/// carry over to the multipart reader. Every part is read to the end before returning, including file parts past
/// [`MAX_FORM_FILES`], so nothing of the body is left unconsumed.
///
/// # Errors
///
/// Returns `FormError::InvalidBoundary` when the content type has no boundary,
/// `FormError::EmptyBody` when the body is empty,
/// `FormError::FileTooLarge` when a file exceeds `max_file_bytes`, and
/// `FormError::Malformed` for any other multipart syntax error.
pub async fn parse_multipart_form(
    request: Request,
    max_file_bytes: usize,
) -> Result<ParsedFormData, FormError> {
    if request.body().size_hint().exact() == Some(0) {
        return Err(FormError::EmptyBody);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| FormError::InvalidBoundary(e.body_text()))?;

    let mut form = ParsedFormData::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| FormError::Malformed(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| FormError::Malformed(e.body_text()))?;
            form.fields.insert(field_name, value);
            continue;
        };

        let accept = form.files.len() < MAX_FORM_FILES;
        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| FormError::Malformed(e.body_text()))?
        {
            if !accept {
                continue;
            }
            if data.len() + chunk.len() > max_file_bytes {
                return Err(FormError::FileTooLarge {
                    limit: max_file_bytes,
                });
            }
            data.extend_from_slice(&chunk);
        }

        if !accept {
            debug!("Ignoring extra file part {field_name} ({file_name})");
            continue;
        }

        form.files.push(ParsedFile {
            field_name,
            file_name: if file_name.is_empty() {
                "unknown".to_string()
            } else {
                file_name
            },
            content_type,
            data: Bytes::from(data),
        });
    }

    Ok(form)
}

/// Infers a content type from the extension of `file_name`
#[must_use]
pub fn mime_type_from_extension(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
