//! Shared fixtures for the post-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use post_service::db::InMemoryStore;
use post_service::error::{AppError, Result};
use post_service::identity::IdentityDirectory;
use post_service::media::InMemoryMediaStore;
use post_service::models::{AuthorSummary, ListUpdate, UserRecord};
use post_service::resilience::RetryPolicy;
use post_service::{EngineContext, FeedEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 1024;

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub media: Arc<InMemoryMediaStore>,
    pub identity: Arc<FlakyDirectory>,
    pub engine: FeedEngine,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let media = Arc::new(InMemoryMediaStore::new(
            "https://media.test/posts",
            MAX_IMAGE_BYTES,
        ));
        let identity = Arc::new(FlakyDirectory::new(store.clone()));
        let ctx = EngineContext::new(store.clone(), identity.clone(), media.clone())
            .with_retry_policy(fast_retry());
        Self {
            store,
            media,
            identity,
            engine: FeedEngine::new(ctx),
        }
    }

    pub async fn user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.add_user(id, username, None).await;
        id
    }

    pub async fn record(&self, user_id: Uuid) -> UserRecord {
        self.store
            .get_user(user_id)
            .await
            .unwrap()
            .expect("user should exist")
    }
}

pub fn fast_retry() -> RetryPolicy {
    let mut policy = RetryPolicy::new(2, Duration::from_millis(1));
    policy.max_backoff = Duration::from_millis(2);
    policy
}

/// Delegating directory whose author-list and saved-list cleanup writes can
/// be switched into an outage.
pub struct FlakyDirectory {
    inner: Arc<InMemoryStore>,
    fail_post_list: AtomicBool,
    fail_saved_cleanup: AtomicBool,
}

impl FlakyDirectory {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            fail_post_list: AtomicBool::new(false),
            fail_saved_cleanup: AtomicBool::new(false),
        }
    }

    pub fn fail_post_list(&self, fail: bool) {
        self.fail_post_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saved_cleanup(&self, fail: bool) {
        self.fail_saved_cleanup.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityDirectory for FlakyDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        self.inner.get_user(user_id).await
    }

    async fn get_profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorSummary>> {
        self.inner.get_profiles(user_ids).await
    }

    async fn update_post_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<()> {
        if self.fail_post_list.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("identity directory offline".into()));
        }
        self.inner.update_post_list(user_id, update, post_id).await
    }

    async fn update_saved_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<bool> {
        self.inner.update_saved_list(user_id, update, post_id).await
    }

    async fn remove_saved_everywhere(&self, post_id: Uuid) -> Result<u64> {
        if self.fail_saved_cleanup.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("identity directory offline".into()));
        }
        self.inner.remove_saved_everywhere(post_id).await
    }
}
