/// Identity directory client
///
/// Resolves users to profile fields, friend whitelists, authored post lists
/// and saved post lists. This service never fabricates users; it only reads
/// profiles/friends and maintains the `posts` and `saved` lists.
pub mod postgres;

pub use postgres::PgIdentityDirectory;

use crate::error::Result;
use crate::models::{AuthorSummary, ListUpdate, UserRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>>;

    /// Batched profile lookup; unknown ids are absent from the map.
    async fn get_profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorSummary>>;

    async fn update_post_list(&self, user_id: Uuid, update: ListUpdate, post_id: Uuid)
        -> Result<()>;

    /// Conditional write on the saved set. Returns whether the set changed.
    async fn update_saved_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<bool>;

    /// Drop `post_id` from every user's saved set. Returns how many were removed.
    async fn remove_saved_everywhere(&self, post_id: Uuid) -> Result<u64>;
}
