use crate::types::Environment;
use aide::openapi::{Info, OpenApi};
use aide::{axum::ApiRouter, scalar::Scalar};
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Extension, Json};

const API_TITLE: &str = "Bucket Storage API";
const DOCS_TITLE: &str = "Bucket Storage API Docs";
const SCHEMA_PATH: &str = "/swagger.json";

/// OpenAPI document the routes are registered into
pub fn api_document() -> OpenApi {
    OpenApi {
        info: Info {
            title: API_TITLE.to_string(),
            description: Some(
                "Header-driven access to S3 buckets: provisioning, listing, uploads and presigned downloads."
                    .to_string(),
            ),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    }
}

/// Routes for the API reference UI and its `OpenAPI` JSON, which is only served outside production
pub fn handler() -> ApiRouter {
    let scalar = Scalar::new(SCHEMA_PATH).with_title(DOCS_TITLE);

    ApiRouter::new()
        .route("/swagger", scalar.axum_route())
        .route(SCHEMA_PATH, get(serve_schema))
}

/// Serves the generated document, hidden in production
#[allow(clippy::unused_async)]
async fn serve_schema(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> impl IntoResponse {
    if environment.show_api_docs() {
        Json(openapi).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
