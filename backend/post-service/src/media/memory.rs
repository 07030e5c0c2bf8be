use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{check_payload, image_extension, MediaStore};
use crate::error::{AppError, Result};

/// Keeps images in process memory. Used by the `memory` storage backend and
/// tests; `set_available(false)` simulates an outage.
pub struct InMemoryMediaStore {
    base_url: String,
    max_image_bytes: usize,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>, max_image_bytes: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_image_bytes,
            objects: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

impl Default for InMemoryMediaStore {
    fn default() -> Self {
        Self::new("http://localhost/media", 10 * 1024 * 1024)
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        check_payload(&bytes, self.max_image_bytes)?;
        let ext = image_extension(content_type)?;

        if !self.available.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("media store unavailable".to_string()));
        }

        let key = format!("{}.{}", Uuid::new_v4(), ext);
        let url = format!("{}/{}", self.base_url, key);
        self.objects.write().await.insert(key, bytes);
        Ok(url)
    }
}
