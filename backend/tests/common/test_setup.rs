use axum::{body::Body, http::Request, response::Response, Router};
use std::sync::Arc;
use storage_backend::{server, types::Environment};
use tower::ServiceExt;

use super::memory_store::MemoryStorageProvider;

/// Expiry used by presigned URLs in tests
pub const TEST_PRESIGN_EXPIRY_SECS: u64 = 600;

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to an in-memory storage backend
pub struct TestSetup {
    pub router: Router,
    pub environment: Environment,
    pub storage: MemoryStorageProvider,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorageProvider::default())
    }

    pub fn with_storage(storage: MemoryStorageProvider) -> Self {
        setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override: Some(TEST_PRESIGN_EXPIRY_SECS),
        };

        let router = server::router(environment.clone(), Arc::new(storage.clone()));

        Self {
            router,
            environment,
            storage,
        }
    }

    /// Sends a request with the given headers and body
    pub async fn send_request(
        &self,
        method: &str,
        route: &str,
        headers: &[(&str, &str)],
        body: Body,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method(method);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(body)?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("GET", route, headers, Body::empty()).await
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("POST", route, headers, body.into()).await
    }
}
