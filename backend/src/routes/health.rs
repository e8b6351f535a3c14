use aide::axum::IntoApiResponse;
use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Serialize;

/// Liveness report returned by `/health`
#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    /// Always `healthy` while the process answers
    status: String,
    /// Time the check was answered (ISO-8601 UTC)
    timestamp: String,
    /// Current version of the application
    version: String,
    /// Commit hash of the current build (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    /// Name of the service answering
    service: String,
}

/// Health check endpoint
///
/// Returns the current status and version information of the service.
/// This endpoint can be used for monitoring and deployment verification.
pub async fn handler() -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rev: option_env!("GIT_REV").map(ToString::to_string),
        service: "Bucket Storage API".to_string(),
    })
}
