//! Bucket Storage API service
//!
//! HTTP handlers exposing list, upload, download and ensure-bucket operations
//! over an S3-compatible object store. Bucket and file identifiers travel in
//! request headers; every request builds its own storage client.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

/// Multipart form parsing for uploads
pub mod form_data;

/// Response middleware
pub mod middleware;

/// Object storage adapter and bucket provisioning
pub mod object_storage;

/// HTTP routes
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// Configuration, errors and extractors
pub mod types;
