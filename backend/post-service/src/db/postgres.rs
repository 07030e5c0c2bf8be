//! Postgres-backed content store.
//!
//! Each trait method runs as one transaction (or one statement). Reactions
//! lock the post row before reading the existing (author, post) reaction, so
//! concurrent reacts on the same post are serialized; the unique index on
//! `reactions(author_id, post_id)` is the commit-time backstop.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{comment_repo, post_repo, reaction_repo, ContentStore};
use crate::error::{AppError, Result};
use crate::models::{
    AppliedReaction, CascadeReport, Comment, NewPost, Page, Post, Reaction, ReactionState,
    ReactionTransition,
};

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Turn rows into posts with their comment and reaction references.
    async fn hydrate(&self, rows: Vec<post_repo::PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let comments = comment_repo::find_comments_for_posts(&self.pool, &ids).await?;
        let reactions = reaction_repo::find_reactions_for_posts(&self.pool, &ids).await?;

        let mut comment_refs: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for comment in comments {
            comment_refs.entry(comment.post_id).or_default().push(comment.id);
        }
        let mut reaction_refs: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for reaction in reactions {
            reaction_refs
                .entry(reaction.post_id)
                .or_default()
                .push(reaction.id);
        }

        rows.into_iter()
            .map(|row| {
                let mut post = row.into_post()?;
                post.comment_ids = comment_refs.remove(&post.id).unwrap_or_default();
                post.reaction_ids = reaction_refs.remove(&post.id).unwrap_or_default();
                Ok(post)
            })
            .collect()
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        let row = post_repo::insert_post(&self.pool, &new_post).await?;
        row.into_post()
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        match post_repo::find_post_by_id(&self.pool, post_id).await? {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Post>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = post_repo::find_posts_by_ids(&self.pool, post_ids).await?;
        let mut by_id: HashMap<Uuid, Post> = self
            .hydrate(rows)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(post_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn delete_post_cascade(&self, post_id: Uuid) -> Result<Option<CascadeReport>> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent comment inserts (FOR SHARE) and reactions (FOR UPDATE)
        if !post_repo::lock_post_for_update(&mut *tx, post_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let reactions_removed = reaction_repo::delete_reactions_for_post(&mut *tx, post_id).await?;
        let comments_removed = comment_repo::delete_comments_for_post(&mut *tx, post_id).await?;
        let deleted = post_repo::delete_post(&mut *tx, post_id).await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        debug!(
            %post_id,
            comments_removed,
            reactions_removed,
            "post cascade committed"
        );

        Ok(Some(CascadeReport {
            comments_removed,
            reactions_removed,
        }))
    }

    async fn visible_posts(
        &self,
        viewer_id: Uuid,
        friend_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Post>> {
        let bigint = |value: usize| {
            i64::try_from(value)
                .map_err(|_| AppError::Validation(format!("page bound {} out of range", value)))
        };
        let rows = post_repo::find_visible_posts(
            &self.pool,
            viewer_id,
            friend_ids,
            bigint(page.limit)?,
            bigint(page.offset)?,
        )
        .await?;
        self.hydrate(rows).await
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        if !post_repo::lock_post_for_share(&mut *tx, post_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = comment_repo::insert_comment(&mut *tx, post_id, author_id, text).await?;
        tx.commit().await?;

        Ok(Some(row.into()))
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(comment_repo::find_comment(&self.pool, comment_id)
            .await?
            .map(Comment::from))
    }

    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(comment_repo::find_comments_for_posts(&self.pool, post_ids)
            .await?
            .into_iter()
            .map(Comment::from)
            .collect())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, comment_id).await? > 0)
    }

    async fn reactions_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(reaction_repo::find_reactions_for_posts(&self.pool, post_ids)
            .await?
            .into_iter()
            .map(Reaction::from)
            .collect())
    }

    async fn apply_reaction(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        kind: &str,
    ) -> Result<Option<AppliedReaction>> {
        let mut tx = self.pool.begin().await?;

        if !post_repo::lock_post_for_update(&mut *tx, post_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let existing: Option<Reaction> = reaction_repo::find_reaction(&mut *tx, post_id, author_id)
            .await?
            .map(Reaction::from);

        let applied = match ReactionState::from_existing(existing.as_ref()).transition(kind) {
            ReactionTransition::Remove { reaction_id } => {
                reaction_repo::delete_reaction(&mut *tx, reaction_id).await?;
                let removed = existing.ok_or_else(|| {
                    AppError::Internal("removed reaction vanished inside transaction".to_string())
                })?;
                AppliedReaction::Removed(removed)
            }
            ReactionTransition::Update { reaction_id, kind } => {
                let row = reaction_repo::update_reaction_type(&mut *tx, reaction_id, &kind).await?;
                AppliedReaction::Updated(row.into())
            }
            ReactionTransition::Create { kind } => {
                let row = reaction_repo::insert_reaction(&mut *tx, post_id, author_id, &kind).await?;
                AppliedReaction::Created(row.into())
            }
        };

        tx.commit().await?;
        Ok(Some(applied))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
