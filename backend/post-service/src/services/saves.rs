/// Save service - saved-post toggling, saved list and shares
use tracing::{debug, info};
use uuid::Uuid;

use super::enrich::enrich_posts;
use super::posts::publish;
use super::EngineContext;
use crate::error::Result;
use crate::metrics::engine::OPERATION_DURATION_SECONDS;
use crate::models::{ListUpdate, NewPost, Post, PostView, SaveToggleResponse, UserRecord};

#[derive(Clone)]
pub struct SaveService {
    ctx: EngineContext,
}

impl SaveService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Flip the post's membership in the user's saved set and return the
    /// resulting saved list.
    ///
    /// Runs as conditional writes: a remove that changed nothing means the
    /// post was not saved, so it is added instead.
    pub async fn toggle_save(&self, user_id: Uuid, post_id: Uuid) -> Result<SaveToggleResponse> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["toggle_save"])
            .start_timer();

        let user = self.ctx.require_user(user_id).await?;
        let viewer = user.viewer();
        self.ctx.require_visible_post(&viewer, post_id).await?;

        let removed = self
            .ctx
            .timed(
                "identity.update_saved_list",
                self.ctx
                    .identity
                    .update_saved_list(user_id, ListUpdate::Remove, post_id),
            )
            .await?;

        let saved = if removed {
            false
        } else {
            self.ctx
                .timed(
                    "identity.update_saved_list",
                    self.ctx
                        .identity
                        .update_saved_list(user_id, ListUpdate::Add, post_id),
                )
                .await?;
            true
        };

        debug!(%user_id, %post_id, saved, "saved state toggled");

        Ok(SaveToggleResponse {
            saved,
            saved_posts: self.saved_posts(user_id).await?,
        })
    }

    /// The user's saved posts in save order, enriched. Ids whose post has
    /// been deleted are skipped.
    pub async fn saved_posts(&self, user_id: Uuid) -> Result<Vec<PostView>> {
        let user = self.ctx.require_user(user_id).await?;
        self.enrich_saved(&user).await
    }

    async fn enrich_saved(&self, user: &UserRecord) -> Result<Vec<PostView>> {
        if user.saved.is_empty() {
            return Ok(Vec::new());
        }
        let posts = self
            .ctx
            .timed("store.find_posts", self.ctx.store.find_posts(&user.saved))
            .await?;
        enrich_posts(&self.ctx, &user.viewer(), posts).await
    }

    /// Repost `post_id` as a new post owned by `user_id`.
    ///
    /// The original must exist and be visible to the sharer; it is not modified.
    pub async fn share_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        caption: Option<String>,
    ) -> Result<Post> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["share_post"])
            .start_timer();

        let viewer = self.ctx.require_user(user_id).await?.viewer();
        let original = self.ctx.require_visible_post(&viewer, post_id).await?;

        let new_post = NewPost::new(user_id, caption, None, None, Some(original.id))?;
        let share = publish(&self.ctx, new_post).await?;

        info!(share_id = %share.id, original_post_id = %original.id, %user_id, "post shared");
        Ok(share)
    }
}
