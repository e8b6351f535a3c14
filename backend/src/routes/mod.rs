mod buckets;
pub(crate) mod docs;
pub mod files;
mod health;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, middleware};
use tower::ServiceBuilder;

use crate::middleware::{cors_middleware, handle_timeout_error, CorsPolicy};

const ENSURE_BUCKET_HEADERS: &str = "Content-Type, x-functions-key, x-bucket-name";
const FILES_HEADERS: &str = "Content-Type, x-functions-key, x-bucket-name, x-file-path";
const FILES_UPLOAD_HEADERS: &str =
    "Content-Type, x-functions-key, x-bucket-name, x-file-key, x-file";
const FILES_DOWNLOAD_HEADERS: &str =
    "Content-Type, x-functions-key, x-bucket-name, x-file-key, x-file-path";

/// Answers CORS preflight checks; headers are added by [`cors_middleware`]
#[allow(clippy::unused_async)]
async fn preflight() {}

/// Applies the request timeout and, around it, the CORS headers of `policy`
fn with_cors(router: ApiRouter, policy: CorsPolicy, request_timeout: Duration) -> ApiRouter {
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn_with_state(policy, cors_middleware))
}

/// Creates the router with all handler routes
pub fn handler(request_timeout: Duration) -> ApiRouter {
    let ensure_bucket = ApiRouter::new().api_route(
        "/ensure-bucket",
        get(buckets::ensure_bucket)
            .post(buckets::ensure_bucket)
            .options(preflight),
    );

    let list_files = ApiRouter::new().api_route(
        "/files",
        get(files::list_files)
            .post(files::list_files)
            .options(preflight),
    );

    let upload_file = ApiRouter::new().api_route(
        "/files-upload",
        post(files::upload_file).options(preflight),
    );

    let download_file = ApiRouter::new().api_route(
        "/files-download",
        post(files::download_file).options(preflight),
    );

    let health = ApiRouter::new().api_route("/health", get(health::handler));

    ApiRouter::new()
        .merge(docs::handler())
        .merge(with_cors(
            health,
            CorsPolicy::origin_only(),
            request_timeout,
        ))
        .merge(with_cors(
            ensure_bucket,
            CorsPolicy::data_route(ENSURE_BUCKET_HEADERS),
            request_timeout,
        ))
        .merge(with_cors(
            list_files,
            CorsPolicy::data_route(FILES_HEADERS),
            request_timeout,
        ))
        .merge(with_cors(
            upload_file,
            CorsPolicy::data_route(FILES_UPLOAD_HEADERS),
            request_timeout,
        ))
        .merge(with_cors(
            download_file,
            CorsPolicy::data_route(FILES_DOWNLOAD_HEADERS),
            request_timeout,
        ))
}
