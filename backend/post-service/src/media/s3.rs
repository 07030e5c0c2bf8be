use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, error};
use uuid::Uuid;

use super::{check_payload, image_extension, MediaStore};
use crate::config::MediaConfig;
use crate::error::{AppError, Result};

/// S3-backed media store. Objects are served from `public_base_url`.
#[derive(Clone)]
pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base_url: String,
    key_prefix: String,
    max_image_bytes: usize,
}

impl S3MediaStore {
    pub fn new(client: Client, config: &MediaConfig, bucket: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            key_prefix: config.key_prefix.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Build a client from the ambient AWS configuration (env, profile, IMDS).
    pub async fn from_env(config: &MediaConfig, bucket: String) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self::new(Client::new(&sdk_config), config, bucket)
    }

    fn object_key(&self, ext: &str) -> String {
        format!("{}{}.{}", self.key_prefix, Uuid::new_v4(), ext)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        check_payload(&bytes, self.max_image_bytes)?;
        let ext = image_extension(content_type)?;
        let key = self.object_key(ext);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %e, "S3 put_object failed");
                AppError::Dependency(format!("media store upload failed: {}", e))
            })?;

        debug!(key = %key, size, "image stored");
        Ok(self.public_url(&key))
    }
}
