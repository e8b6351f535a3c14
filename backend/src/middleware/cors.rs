//! Cross-origin response headers

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue,
    },
    middleware::Next,
    response::Response,
    Extension,
};

use crate::types::Environment;

/// Methods accepted by every data route
pub const DATA_ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// CORS headers attached to the responses of one route group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsPolicy {
    /// Request headers browsers may send, `None` for routes that only expose an origin
    allow_headers: Option<&'static str>,
}

impl CorsPolicy {
    /// Policy for routes that only announce the allowed origin
    #[must_use]
    pub const fn origin_only() -> Self {
        Self {
            allow_headers: None,
        }
    }

    /// Policy for a data route accepting the given request headers
    #[must_use]
    pub const fn data_route(allow_headers: &'static str) -> Self {
        Self {
            allow_headers: Some(allow_headers),
        }
    }
}

/// Adds CORS headers to every response, including errors
///
/// The allowed origin comes from the deployment configuration so it can be
/// narrowed without a rebuild.
pub async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    Extension(environment): Extension<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let origin = HeaderValue::from_str(&environment.cors_origins())
        .unwrap_or_else(|_| HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);

    if let Some(allow_headers) = policy.allow_headers {
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(DATA_ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(allow_headers),
        );
    }

    response
}
