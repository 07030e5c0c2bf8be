/// Media store client
///
/// Turns uploaded image bytes into a durable URL. Post creation calls this
/// before any post row is written, so a failure here aborts the create.
pub mod memory;
pub mod s3;

pub use memory::InMemoryMediaStore;
pub use s3::S3MediaStore;

use crate::error::{AppError, Result};
use async_trait::async_trait;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the image and return its public URL.
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Result<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        "image/heic" => Ok("heic"),
        other => Err(AppError::Validation(format!(
            "unsupported image content type '{}'",
            other
        ))),
    }
}

/// Reject empty and oversized payloads before touching the backend.
pub fn check_payload(bytes: &[u8], max_bytes: usize) -> Result<()> {
    if bytes.is_empty() {
        return Err(AppError::Validation("image payload is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "image exceeds {} bytes",
            max_bytes
        )));
    }
    Ok(())
}
