use std::sync::Arc;

use storage_backend::{
    object_storage::{S3StorageProvider, SharedStorageProvider},
    server,
    types::Environment,
};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // Use JSON format for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(env_filter).init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(env_filter).init();
        }
    }

    tracing::info!("Starting Bucket Storage API in {environment:?} environment");

    if environment.aws_region().is_none() {
        tracing::warn!("AWS_REGION is not set, ensure-bucket requests will fail");
    }

    let storage_provider: SharedStorageProvider =
        Arc::new(S3StorageProvider::new(environment.clone()));

    server::start(environment, storage_provider).await
}
