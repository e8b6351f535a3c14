use axum::{extract::DefaultBodyLimit, Extension, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::form_data::multipart_body_limit;
use crate::routes;
use crate::{object_storage::SharedStorageProvider, types::Environment};

/// Builds the application router with its documentation and shared dependencies
pub fn router(environment: Environment, storage_provider: SharedStorageProvider) -> Router {
    let mut openapi = routes::docs::api_document();
    let request_timeout = environment.request_timeout();
    let max_upload_bytes = environment.max_upload_bytes();

    routes::handler(request_timeout)
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(storage_provider))
        .layer(DefaultBodyLimit::max(multipart_body_limit(max_upload_bytes)))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    storage_provider: SharedStorageProvider,
) -> anyhow::Result<()> {
    let router = router(environment, storage_provider);

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Bucket Storage API started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
