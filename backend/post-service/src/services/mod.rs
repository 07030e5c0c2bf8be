/// Business logic layer for post-service
///
/// This module provides the feed and interaction engine:
/// - Post service: publish (with media upload), find, delete with cascade
/// - Feed service: visibility-scoped feed and single-post reads
/// - Reaction service: one-reaction-per-user toggle/update/create
/// - Comment service: append, list and authorized delete
/// - Save service: saved-post toggling and shares
///
/// Every service works against the `ContentStore`, `IdentityDirectory` and
/// `MediaStore` seams, so the same logic runs on Postgres and in memory.
pub mod comments;
pub mod enrich;
pub mod feed;
pub mod posts;
pub mod reactions;
pub mod saves;

pub use comments::CommentService;
pub use feed::{FeedQuery, FeedService};
pub use posts::{CreatePostInput, ImageUpload, PostDeletion, PostService};
pub use reactions::{ReactionOutcome, ReactionService};
pub use saves::SaveService;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{FeedConfig, RequestConfig};
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::identity::IdentityDirectory;
use crate::media::MediaStore;
use crate::models::{Post, UserRecord, Viewer};
use crate::resilience::{with_deadline, RetryPolicy};

/// Collaborators and limits shared by every service.
#[derive(Clone)]
pub struct EngineContext {
    pub store: Arc<dyn ContentStore>,
    pub identity: Arc<dyn IdentityDirectory>,
    pub media: Arc<dyn MediaStore>,
    /// Deadline applied to each store, directory or media call
    pub deadline: Duration,
    /// Policy for compensating and cleanup steps
    pub retry: RetryPolicy,
    pub feed: FeedConfig,
}

impl EngineContext {
    pub fn new(
        store: Arc<dyn ContentStore>,
        identity: Arc<dyn IdentityDirectory>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let request = RequestConfig::default();
        Self {
            store,
            identity,
            media,
            deadline: request.store_timeout(),
            retry: RetryPolicy::new(
                request.compensation_retry_attempts,
                request.compensation_backoff(),
            ),
            feed: FeedConfig::default(),
        }
    }

    pub fn with_request_config(mut self, request: &RequestConfig) -> Self {
        self.deadline = request.store_timeout();
        self.retry = RetryPolicy::new(
            request.compensation_retry_attempts,
            request.compensation_backoff(),
        );
        self
    }

    pub fn with_feed_config(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one collaborator call under the configured deadline.
    pub(crate) async fn timed<F, T>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_deadline(operation, self.deadline, future).await
    }

    /// Resolve a user or fail with `NotFound`; users are never fabricated.
    pub(crate) async fn require_user(&self, user_id: Uuid) -> Result<UserRecord> {
        self.timed("identity.get_user", self.identity.get_user(user_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }

    /// Resolve a post the viewer may see. Hidden posts read as missing.
    pub(crate) async fn require_visible_post(&self, viewer: &Viewer, post_id: Uuid) -> Result<Post> {
        self.timed("store.find_post", self.store.find_post(post_id))
            .await?
            .filter(|p| viewer.can_see(p))
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
    }
}

/// Facade bundling the services over one context.
#[derive(Clone)]
pub struct FeedEngine {
    pub posts: PostService,
    pub feed: FeedService,
    pub reactions: ReactionService,
    pub comments: CommentService,
    pub saves: SaveService,
    ctx: EngineContext,
}

impl FeedEngine {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            posts: PostService::new(ctx.clone()),
            feed: FeedService::new(ctx.clone()),
            reactions: ReactionService::new(ctx.clone()),
            comments: CommentService::new(ctx.clone()),
            saves: SaveService::new(ctx.clone()),
            ctx,
        }
    }

    /// Readiness of the content store.
    pub async fn health_check(&self) -> Result<()> {
        self.ctx
            .timed("store.health_check", self.ctx.store.health_check())
            .await
    }
}
