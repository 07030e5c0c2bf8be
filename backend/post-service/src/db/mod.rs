/// Database access layer
///
/// This module provides:
/// - `ContentStore`: the persistence seam for posts, comments and reactions
/// - `PgContentStore`: Postgres implementation (sqlx), transactional per operation
/// - `InMemoryStore`: process-local implementation used by tests and the
///   `memory` storage backend; it also acts as an identity directory
/// - Repository functions for each table, generic over the executor so they
///   compose inside a transaction
pub mod comment_repo;
pub mod memory;
pub mod post_repo;
pub mod postgres;
pub mod reaction_repo;

pub use memory::InMemoryStore;
pub use postgres::PgContentStore;

use crate::error::Result;
use crate::models::{AppliedReaction, CascadeReport, Comment, NewPost, Page, Post, Reaction};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for the three related collections.
///
/// Every method is one atomic unit from the caller's point of view.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_post(&self, new_post: NewPost) -> Result<Post>;

    /// `None` when no such post exists.
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Posts for the given ids, in the order of `post_ids`, skipping missing ones.
    async fn find_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Post>>;

    /// Remove the post and every comment and reaction that references it.
    /// Returns `None` if the post was already gone.
    async fn delete_post_cascade(&self, post_id: Uuid) -> Result<Option<CascadeReport>>;

    /// Posts visible to `viewer_id`, newest first, equal timestamps in
    /// insertion order. Evaluated as one filtered query.
    async fn visible_posts(
        &self,
        viewer_id: Uuid,
        friend_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Post>>;

    /// Append a comment. Returns `None` if the post does not exist.
    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Comment>>;

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Comments of all given posts, each post's comments in creation order.
    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>>;

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.comments_for_posts(&[post_id]).await
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool>;

    /// Reactions of all given posts, each post's reactions in creation order.
    async fn reactions_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Reaction>>;

    /// Run the reaction state machine for (author, post) atomically.
    /// Returns `None` if the post does not exist.
    async fn apply_reaction(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        kind: &str,
    ) -> Result<Option<AppliedReaction>>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
