/// Post service - publish, find, delete and author-list reconciliation
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::EngineContext;
use crate::error::{AppError, Result};
use crate::metrics::engine::{
    CASCADE_DELETED_TOTAL, OPERATION_DURATION_SECONDS, RECONCILIATION_PENDING_TOTAL,
};
use crate::models::{check_caption, normalize_text, ListUpdate, NewPost, Post, Visibility};

/// Raw image supplied with a new post.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub caption: Option<String>,
    pub visibility: Option<Visibility>,
    pub image: Option<ImageUpload>,
}

/// What a successful delete removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDeletion {
    pub post_id: Uuid,
    pub comments_removed: u64,
    pub reactions_removed: u64,
    pub saved_refs_removed: u64,
    /// Some user list still references the post and awaits reconciliation
    pub reconciliation_pending: bool,
}

#[derive(Clone)]
pub struct PostService {
    ctx: EngineContext,
}

impl PostService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Publish a post, uploading its image first.
    ///
    /// Nothing is written when validation or the upload fails.
    pub async fn create_post(&self, author_id: Uuid, input: CreatePostInput) -> Result<Post> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["create_post"])
            .start_timer();

        let caption = normalize_text(input.caption);
        if caption.is_none() && input.image.is_none() {
            return Err(AppError::Validation(
                "a post needs a caption or an image".to_string(),
            ));
        }
        check_caption(caption.as_deref())?;
        self.ctx.require_user(author_id).await?;

        let image_url = match input.image {
            Some(image) => Some(
                self.ctx
                    .timed(
                        "media.store_image",
                        self.ctx.media.store_image(image.bytes, &image.content_type),
                    )
                    .await?,
            ),
            None => None,
        };

        let new_post = NewPost::new(author_id, caption, image_url, input.visibility, None)?;
        publish(&self.ctx, new_post).await
    }

    /// Returns absence rather than failing when not found.
    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.ctx
            .timed("store.find_post", self.ctx.store.find_post(post_id))
            .await
    }

    /// Delete a post with its comments and reactions, then drop it from the
    /// author's list and every saved list.
    ///
    /// The cascade is one store transaction. List cleanup that still fails
    /// after retries leaves the delete successful with
    /// `reconciliation_pending` set.
    pub async fn delete_post(&self, post_id: Uuid, requester_id: Uuid) -> Result<PostDeletion> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["delete_post"])
            .start_timer();

        let post = self
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        if post.author_id != requester_id {
            warn!(%post_id, %requester_id, "delete rejected: requester is not the author");
            return Err(AppError::Unauthorized(
                "only the author can delete this post".to_string(),
            ));
        }

        let report = self
            .ctx
            .timed(
                "store.delete_post_cascade",
                self.ctx.store.delete_post_cascade(post_id),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        CASCADE_DELETED_TOTAL.with_label_values(&["post"]).inc();
        CASCADE_DELETED_TOTAL
            .with_label_values(&["comment"])
            .inc_by(report.comments_removed);
        CASCADE_DELETED_TOTAL
            .with_label_values(&["reaction"])
            .inc_by(report.reactions_removed);

        let mut reconciliation_pending = false;

        let author_list = self
            .ctx
            .retry
            .run("identity.update_post_list", || {
                self.ctx.timed(
                    "identity.update_post_list",
                    self.ctx
                        .identity
                        .update_post_list(post.author_id, ListUpdate::Remove, post_id),
                )
            })
            .await;
        if let Err(err) = author_list {
            error!(
                %post_id,
                author_id = %post.author_id,
                error = %err,
                "author post list still references deleted post; reconcile required"
            );
            RECONCILIATION_PENDING_TOTAL
                .with_label_values(&["author_post_list"])
                .inc();
            reconciliation_pending = true;
        }

        let saved_refs_removed = match self
            .ctx
            .retry
            .run("identity.remove_saved_everywhere", || {
                self.ctx.timed(
                    "identity.remove_saved_everywhere",
                    self.ctx.identity.remove_saved_everywhere(post_id),
                )
            })
            .await
        {
            Ok(removed) => {
                CASCADE_DELETED_TOTAL
                    .with_label_values(&["saved_ref"])
                    .inc_by(removed);
                removed
            }
            Err(err) => {
                error!(
                    %post_id,
                    error = %err,
                    "saved lists still reference deleted post; reads will skip it"
                );
                RECONCILIATION_PENDING_TOTAL
                    .with_label_values(&["saved_refs"])
                    .inc();
                reconciliation_pending = true;
                0
            }
        };

        info!(
            %post_id,
            comments_removed = report.comments_removed,
            reactions_removed = report.reactions_removed,
            saved_refs_removed,
            reconciliation_pending,
            "post deleted"
        );

        Ok(PostDeletion {
            post_id,
            comments_removed: report.comments_removed,
            reactions_removed: report.reactions_removed,
            saved_refs_removed,
            reconciliation_pending,
        })
    }

    /// Drop ids of posts that no longer exist from the user's `posts` list.
    /// Returns how many were removed.
    pub async fn reconcile_author_posts(&self, user_id: Uuid) -> Result<u64> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["reconcile_author_posts"])
            .start_timer();

        let user = self.ctx.require_user(user_id).await?;
        if user.posts.is_empty() {
            return Ok(0);
        }

        let existing: Vec<Uuid> = self
            .ctx
            .timed("store.find_posts", self.ctx.store.find_posts(&user.posts))
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut removed = 0;
        for post_id in user.posts.iter().filter(|id| !existing.contains(id)) {
            self.ctx
                .timed(
                    "identity.update_post_list",
                    self.ctx
                        .identity
                        .update_post_list(user_id, ListUpdate::Remove, *post_id),
                )
                .await?;
            removed += 1;
        }

        if removed > 0 {
            info!(%user_id, removed, "reconciled author post list");
        }
        Ok(removed)
    }
}

/// Write a post and add it to the author's list.
///
/// If the list update fails the post is deleted again (with retries) and the
/// create reports `Dependency`, so a returned post is always listed.
pub(crate) async fn publish(ctx: &EngineContext, new_post: NewPost) -> Result<Post> {
    let author_id = new_post.author_id;
    let post = ctx
        .timed("store.insert_post", ctx.store.insert_post(new_post))
        .await?;

    let listed = ctx
        .retry
        .run("identity.update_post_list", || {
            ctx.timed(
                "identity.update_post_list",
                ctx.identity
                    .update_post_list(author_id, ListUpdate::Add, post.id),
            )
        })
        .await;

    match listed {
        Ok(()) => {
            info!(post_id = %post.id, %author_id, share = post.is_share(), "post published");
            Ok(post)
        }
        Err(list_err) => {
            warn!(
                post_id = %post.id,
                %author_id,
                error = %list_err,
                "author post list update failed; rolling back post"
            );

            let rollback = ctx
                .retry
                .run("store.delete_post_cascade", || {
                    ctx.timed(
                        "store.delete_post_cascade",
                        ctx.store.delete_post_cascade(post.id),
                    )
                })
                .await;
            if let Err(rollback_err) = rollback {
                error!(
                    post_id = %post.id,
                    %author_id,
                    error = %rollback_err,
                    "post rollback failed; unlisted post remains"
                );
                RECONCILIATION_PENDING_TOTAL
                    .with_label_values(&["unlisted_post"])
                    .inc();
            }

            match list_err {
                AppError::NotFound(msg) => Err(AppError::NotFound(msg)),
                other => Err(AppError::Dependency(format!(
                    "could not record post for author: {}",
                    other
                ))),
            }
        }
    }
}
