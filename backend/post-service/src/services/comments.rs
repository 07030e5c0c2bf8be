/// Comment service - append, list and authorized delete
use tracing::{debug, warn};
use uuid::Uuid;

use super::enrich::enrich_comments;
use super::EngineContext;
use crate::error::{AppError, Result};
use crate::metrics::engine::OPERATION_DURATION_SECONDS;
use crate::models::{CommentView, MAX_COMMENT_LEN};

#[derive(Clone)]
pub struct CommentService {
    ctx: EngineContext,
}

impl CommentService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Append a comment to a post the author can see.
    pub async fn add_comment(&self, author_id: Uuid, post_id: Uuid, text: &str) -> Result<CommentView> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["add_comment"])
            .start_timer();

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("comment text is required".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let author = self.ctx.require_user(author_id).await?;
        self.ctx
            .require_visible_post(&author.viewer(), post_id)
            .await?;

        let comment = self
            .ctx
            .timed(
                "store.insert_comment",
                self.ctx.store.insert_comment(post_id, author_id, text),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        debug!(%post_id, comment_id = %comment.id, "comment added");
        Ok(CommentView::new(comment, author.summary()))
    }

    /// Comments in creation order. A missing post, or one the viewer cannot
    /// see, has no comments.
    pub async fn list_comments(&self, viewer_id: Uuid, post_id: Uuid) -> Result<Vec<CommentView>> {
        let viewer = self.ctx.require_user(viewer_id).await?.viewer();

        let visible = self
            .ctx
            .timed("store.find_post", self.ctx.store.find_post(post_id))
            .await?
            .is_some_and(|p| viewer.can_see(&p));
        if !visible {
            return Ok(Vec::new());
        }

        let comments = self
            .ctx
            .timed("store.comments_for_post", self.ctx.store.comments_for_post(post_id))
            .await?;
        enrich_comments(&self.ctx, comments).await
    }

    /// Delete a comment as its author or as the post's author.
    pub async fn delete_comment(&self, comment_id: Uuid, requester_id: Uuid) -> Result<()> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["delete_comment"])
            .start_timer();

        let comment = self
            .ctx
            .timed("store.find_comment", self.ctx.store.find_comment(comment_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        if comment.author_id != requester_id {
            let post_author = self
                .ctx
                .timed("store.find_post", self.ctx.store.find_post(comment.post_id))
                .await?
                .map(|p| p.author_id);
            if post_author != Some(requester_id) {
                warn!(%comment_id, %requester_id, "comment delete rejected");
                return Err(AppError::Unauthorized(
                    "only the comment author or the post author can delete this comment"
                        .to_string(),
                ));
            }
        }

        let deleted = self
            .ctx
            .timed("store.delete_comment", self.ctx.store.delete_comment(comment_id))
            .await?;
        if !deleted {
            return Err(AppError::NotFound(format!("comment {}", comment_id)));
        }

        debug!(%comment_id, post_id = %comment.post_id, "comment deleted");
        Ok(())
    }
}
