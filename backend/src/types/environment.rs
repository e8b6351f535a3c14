//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use tracing::Level;

/// Region used by storage clients when `AWS_REGION` is not set
pub const DEFAULT_CLIENT_REGION: &str = "us-west-2";

const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const LOCALSTACK_ENDPOINT_URL: &str = "http://localhost:4566";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

/// Reads a variable, treating an empty or whitespace-only value as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Region explicitly configured for the deployment, if any
    ///
    /// Bucket creation requires this to be set; other operations fall back to
    /// [`DEFAULT_CLIENT_REGION`].
    #[must_use]
    pub fn aws_region(&self) -> Option<String> {
        non_empty_var("AWS_REGION")
    }

    /// Region storage clients sign requests for
    #[must_use]
    pub fn client_region(&self) -> String {
        self.aws_region()
            .unwrap_or_else(|| DEFAULT_CLIENT_REGION.to_string())
    }

    /// Static credential pair as `(access_key_id, secret_access_key)`
    #[must_use]
    pub fn aws_credentials(&self) -> Option<(String, String)> {
        Some((
            non_empty_var("AWS_ACCESS_KEY_ID")?,
            non_empty_var("AWS_SECRET_ACCESS_KEY")?,
        ))
    }

    /// Returns the endpoint URL to use for the storage service
    #[must_use]
    pub fn override_aws_endpoint_url(&self) -> Option<String> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some(
                non_empty_var("AWS_ENDPOINT_URL")
                    .unwrap_or_else(|| LOCALSTACK_ENDPOINT_URL.to_string()),
            ),
        }
    }

    /// Whether S3 requests use path-style addressing
    ///
    /// `LocalStack` does not resolve virtual-host bucket names.
    /// <https://github.com/awslabs/aws-sdk-rust/discussions/874>
    #[must_use]
    pub const fn force_path_style(&self) -> bool {
        matches!(self, Self::Development { .. })
    }

    /// Value of the `Access-Control-Allow-Origin` response header
    #[must_use]
    pub fn cors_origins(&self) -> String {
        non_empty_var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string())
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Presigned download URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        }
    }

    /// Largest accepted upload, for both raw bodies and single multipart files
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Ambient timeout applied to every request
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Log level used when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
