//! S3-backed [`ObjectStore`]

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Credentials, Region},
    error::SdkError,
    operation::{get_object::GetObjectError, head_bucket::HeadBucketError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as SmithyDateTime},
    types::{BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration},
    Client, Config,
};
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    error::sdk_message, BucketInfo, FileInfo, ObjectStore, StorageError, StorageProvider,
    StorageResult, CORS_ALLOWED_METHODS, CORS_MAX_AGE_SECS, CORS_RULE_ID, DEFAULT_BUCKET_REGION,
    DEFAULT_CONTENT_TYPE, MAX_LIST_KEYS,
};
use crate::types::Environment;

const MAX_ATTEMPTS: u32 = 3;
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one bucket, assembled per request
#[derive(Clone)]
pub struct StorageConfig {
    /// Region the client signs requests for
    pub region: String,
    /// Access key half of the credential pair
    pub access_key_id: String,
    /// Secret half of the credential pair
    pub secret_access_key: String,
    /// Bucket every object operation targets
    pub bucket_name: String,
    /// Endpoint override (LocalStack in development)
    pub endpoint_url: Option<String>,
    /// Whether to address buckets by path instead of virtual host
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Builds the configuration for `bucket_name` from the deployment environment
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the credential pair is not configured
    /// or the bucket name is empty
    pub fn from_environment(environment: &Environment, bucket_name: &str) -> StorageResult<Self> {
        let (access_key_id, secret_access_key) = environment.aws_credentials().ok_or_else(|| {
            StorageError::Config(
                "Missing required S3 configuration. Please set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables."
                    .to_string(),
            )
        })?;

        if bucket_name.is_empty() {
            return Err(StorageError::Config(
                "Bucket name is required. Please provide the x-bucket-name header.".to_string(),
            ));
        }

        Ok(Self {
            region: environment.client_region(),
            access_key_id,
            secret_access_key,
            bucket_name: bucket_name.to_string(),
            endpoint_url: environment.override_aws_endpoint_url(),
            force_path_style: environment.force_path_style(),
        })
    }

    /// S3 client configuration with retry and timeout settings
    #[must_use]
    pub fn s3_client_config(&self) -> Config {
        let retry_config = RetryConfig::adaptive().with_max_attempts(MAX_ATTEMPTS);

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let credentials = Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            "environment",
        );

        let mut builder = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .force_path_style(self.force_path_style);

        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        builder.build()
    }
}

/// [`StorageProvider`] that connects to S3 with a fresh client per request
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    environment: Environment,
}

impl S3StorageProvider {
    /// Creates a provider reading its settings from `environment`
    #[must_use]
    pub const fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl StorageProvider for S3StorageProvider {
    fn for_bucket(&self, bucket_name: &str) -> StorageResult<Box<dyn ObjectStore>> {
        let config = StorageConfig::from_environment(&self.environment, bucket_name)?;
        Ok(Box::new(S3Storage::new(&config)))
    }
}

/// S3 client bound to one bucket
pub struct S3Storage {
    client: Client,
    bucket_name: String,
}

impl S3Storage {
    /// Creates a new client from `config`
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        debug!(
            "Initialized S3 client for bucket: {} in region: {} with {} max attempts",
            config.bucket_name, config.region, MAX_ATTEMPTS
        );

        Self {
            client: Client::from_conf(config.s3_client_config()),
            bucket_name: config.bucket_name.clone(),
        }
    }
}

fn to_utc(value: Option<&SmithyDateTime>) -> Option<DateTime<Utc>> {
    value.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
}

fn to_size(value: Option<i64>) -> u64 {
    value.and_then(|size| u64::try_from(size).ok()).unwrap_or(0)
}

/// Location constraint sent with a create request
///
/// The default region rejects an explicit constraint, so it gets none.
fn bucket_configuration(region: Option<&str>) -> Option<CreateBucketConfiguration> {
    region
        .filter(|region| *region != DEFAULT_BUCKET_REGION)
        .map(|region| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        })
}

/// Whether a failed head request means the bucket does not exist
///
/// Head responses have no body, so some backends only report the 404 status.
/// Any other status (403 for a bucket owned elsewhere, 301 for a wrong region)
/// is a real failure.
fn is_missing_bucket(err: &HeadBucketError, status: u16) -> bool {
    matches!(err, HeadBucketError::NotFound(_)) || status == 404
}

#[async_trait]
impl ObjectStore for S3Storage {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn list_objects(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .prefix(prefix.unwrap_or_default())
            .max_keys(MAX_LIST_KEYS)
            .send()
            .await
            .map_err(|e| StorageError::ListObjects(sdk_message(&e)))?;

        if output.is_truncated().unwrap_or(false) {
            debug!(
                "Listing of bucket {} truncated at {} keys",
                self.bucket_name, MAX_LIST_KEYS
            );
        }

        Ok(output
            .contents()
            .iter()
            .map(|object| FileInfo {
                key: object.key().unwrap_or_default().to_string(),
                e_tag: object.e_tag().unwrap_or_default().to_string(),
                last_modified: to_utc(object.last_modified()).unwrap_or_default(),
                size: to_size(object.size()),
            })
            .collect())
    }

    async fn upload_file(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<FileInfo> {
        let uploaded_len = data.len() as u64;

        let put_output = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .send()
            .await
            .map_err(|e| StorageError::UploadFile(sdk_message(&e)))?;

        // Upload responses do not carry size or modification time on every backend
        let head_output = self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::UploadFile(sdk_message(&e)))?;

        let e_tag = put_output
            .e_tag()
            .or_else(|| head_output.e_tag())
            .unwrap_or_default()
            .to_string();

        Ok(FileInfo {
            key: key.to_string(),
            e_tag,
            last_modified: to_utc(head_output.last_modified()).unwrap_or_else(Utc::now),
            size: head_output
                .content_length()
                .and_then(|len| u64::try_from(len).ok())
                .unwrap_or(uploaded_len),
        })
    }

    async fn get_file(&self, key: &str) -> StorageResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(ref service_err)
                    if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
                {
                    StorageError::NotFound(key.to_string())
                }
                e => StorageError::GetFile(sdk_message(&e)),
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetFile(e.to_string()))?
            .into_bytes();

        Ok(data)
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Presign(sdk_message(&e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn create_bucket(&self, name: &str, region: Option<&str>) -> StorageResult<BucketInfo> {
        self.client
            .create_bucket()
            .bucket(name)
            .set_create_bucket_configuration(bucket_configuration(region))
            .send()
            .await
            .map_err(|e| StorageError::CreateBucket(sdk_message(&e)))?;

        info!("Created bucket: {name}");

        Ok(BucketInfo {
            bucket: name.to_string(),
            location: region.unwrap_or(DEFAULT_BUCKET_REGION).to_string(),
            exists: true,
            created: true,
            creation_date: Some(Utc::now()),
        })
    }

    async fn head_bucket(&self, name: &str) -> StorageResult<BucketInfo> {
        let result = self.client.head_bucket().bucket(name).send().await;

        match result {
            Ok(_) => {
                let location = match self.bucket_location(name).await {
                    Ok(location) => location,
                    Err(e) => {
                        debug!("Falling back to default region for {name}: {e}");
                        DEFAULT_BUCKET_REGION.to_string()
                    }
                };

                Ok(BucketInfo {
                    bucket: name.to_string(),
                    location,
                    exists: true,
                    created: false,
                    creation_date: None,
                })
            }
            Err(SdkError::ServiceError(service_err))
                if is_missing_bucket(service_err.err(), service_err.raw().status().as_u16()) =>
            {
                debug!("Bucket does not exist: {name}");
                Ok(BucketInfo::missing(name))
            }
            Err(e) => Err(StorageError::HeadBucket(sdk_message(&e))),
        }
    }

    async fn bucket_location(&self, name: &str) -> StorageResult<String> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(name)
            .send()
            .await
            .map_err(|e| StorageError::BucketLocation(sdk_message(&e)))?;

        // No constraint means the bucket lives in the default region
        Ok(output
            .location_constraint()
            .map(BucketLocationConstraint::as_str)
            .filter(|location| !location.is_empty())
            .unwrap_or(DEFAULT_BUCKET_REGION)
            .to_string())
    }

    async fn configure_bucket_cors(&self, name: &str) -> StorageResult<()> {
        let rule = CorsRule::builder()
            .id(CORS_RULE_ID)
            .set_allowed_methods(Some(
                CORS_ALLOWED_METHODS.iter().map(ToString::to_string).collect(),
            ))
            .allowed_origins("*")
            .allowed_headers("*")
            .max_age_seconds(CORS_MAX_AGE_SECS)
            .build()
            .map_err(|e| StorageError::ConfigureCors(e.to_string()))?;

        let cors_configuration = CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|e| StorageError::ConfigureCors(e.to_string()))?;

        self.client
            .put_bucket_cors()
            .bucket(name)
            .cors_configuration(cors_configuration)
            .send()
            .await
            .map_err(|e| StorageError::ConfigureCors(sdk_message(&e)))?;

        Ok(())
    }
}
