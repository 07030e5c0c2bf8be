//! Process-local store.
//!
//! Backs the `memory` storage backend and the test suites. A single
//! `RwLock` guards all collections, so every trait method is atomic and the
//! reaction read-then-write runs under the write lock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContentStore;
use crate::error::{AppError, Result};
use crate::identity::IdentityDirectory;
use crate::models::{
    AppliedReaction, AuthorSummary, CascadeReport, Comment, ListUpdate, NewPost, Page, Post,
    Reaction, ReactionState, ReactionTransition, UserRecord, Viewer,
};

#[derive(Default)]
struct State {
    /// Insertion order
    posts: Vec<Post>,
    comments: Vec<Comment>,
    reactions: Vec<Reaction>,
    users: HashMap<Uuid, UserRecord>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Wall clock, forced strictly increasing so insertion order and time agree.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn hydrate(&self, post: &Post) -> Post {
        let mut post = post.clone();
        post.comment_ids = self
            .comments
            .iter()
            .filter(|c| c.post_id == post.id)
            .map(|c| c.id)
            .collect();
        post.reaction_ids = self
            .reactions
            .iter()
            .filter(|r| r.post_id == post.id)
            .map(|r| r.id)
            .collect();
        post
    }

    fn post_exists(&self, post_id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == post_id)
    }

    fn push_post(&mut self, new_post: NewPost, created_at: DateTime<Utc>) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            caption: new_post.caption,
            image_url: new_post.image_url,
            visibility: new_post.visibility,
            original_post_id: new_post.original_post_id,
            comment_ids: Vec::new(),
            reaction_ids: Vec::new(),
            created_at,
            updated_at: created_at,
        };
        self.posts.push(post.clone());
        post
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user in the directory.
    pub async fn add_user(
        &self,
        user_id: Uuid,
        username: &str,
        profile_picture: Option<&str>,
    ) -> UserRecord {
        let record = UserRecord {
            id: user_id,
            username: username.to_string(),
            profile_picture: profile_picture.map(str::to_string),
            friends: Vec::new(),
            saved: Vec::new(),
            posts: Vec::new(),
        };
        self.state
            .write()
            .await
            .users
            .insert(user_id, record.clone());
        record
    }

    /// Make two users mutual friends.
    pub async fn add_friendship(&self, a: Uuid, b: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        for (user, friend) in [(a, b), (b, a)] {
            let record = state
                .users
                .get_mut(&user)
                .ok_or_else(|| AppError::NotFound(format!("user {}", user)))?;
            if !record.friends.contains(&friend) {
                record.friends.push(friend);
            }
        }
        Ok(())
    }

    /// Insert a post with an explicit creation time.
    pub async fn insert_post_at(&self, new_post: NewPost, created_at: DateTime<Utc>) -> Post {
        let mut state = self.state.write().await;
        state.push_post(new_post, created_at)
    }

    pub async fn comment_count(&self) -> usize {
        self.state.read().await.comments.len()
    }

    pub async fn reaction_count(&self) -> usize {
        self.state.read().await.reactions.len()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        let now = state.now();
        Ok(state.push_post(new_post, now))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| state.hydrate(p)))
    }

    async fn find_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        Ok(post_ids
            .iter()
            .filter_map(|id| state.posts.iter().find(|p| p.id == *id))
            .map(|p| state.hydrate(p))
            .collect())
    }

    async fn delete_post_cascade(&self, post_id: Uuid) -> Result<Option<CascadeReport>> {
        let mut state = self.state.write().await;
        if !state.post_exists(post_id) {
            return Ok(None);
        }

        let comments_before = state.comments.len();
        state.comments.retain(|c| c.post_id != post_id);
        let reactions_before = state.reactions.len();
        state.reactions.retain(|r| r.post_id != post_id);
        state.posts.retain(|p| p.id != post_id);

        Ok(Some(CascadeReport {
            comments_removed: (comments_before - state.comments.len()) as u64,
            reactions_removed: (reactions_before - state.reactions.len()) as u64,
        }))
    }

    async fn visible_posts(
        &self,
        viewer_id: Uuid,
        friend_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let viewer = Viewer {
            id: viewer_id,
            friends: friend_ids.iter().copied().collect(),
        };

        let mut visible: Vec<&Post> = state.posts.iter().filter(|p| viewer.can_see(p)).collect();
        // Stable: equal timestamps keep insertion order
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(visible
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .map(|p| state.hydrate(p))
            .collect())
    }

    async fn insert_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        if !state.post_exists(post_id) {
            return Ok(None);
        }
        let created_at = state.now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text: text.to_string(),
            created_at,
        };
        state.comments.push(comment.clone());
        Ok(Some(comment))
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == comment_id).cloned())
    }

    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != comment_id);
        Ok(state.comments.len() < before)
    }

    async fn reactions_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        let state = self.state.read().await;
        Ok(state
            .reactions
            .iter()
            .filter(|r| post_ids.contains(&r.post_id))
            .cloned()
            .collect())
    }

    async fn apply_reaction(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        kind: &str,
    ) -> Result<Option<AppliedReaction>> {
        let mut state = self.state.write().await;
        if !state.post_exists(post_id) {
            return Ok(None);
        }

        let existing = state
            .reactions
            .iter()
            .position(|r| r.post_id == post_id && r.author_id == author_id);
        let transition =
            ReactionState::from_existing(existing.map(|idx| &state.reactions[idx])).transition(kind);

        let applied = match (transition, existing) {
            (ReactionTransition::Remove { .. }, Some(idx)) => {
                AppliedReaction::Removed(state.reactions.remove(idx))
            }
            (ReactionTransition::Update { kind, .. }, Some(idx)) => {
                let now = state.now();
                let reaction = &mut state.reactions[idx];
                reaction.kind = kind;
                reaction.updated_at = now;
                AppliedReaction::Updated(reaction.clone())
            }
            (ReactionTransition::Create { kind }, None) => {
                let now = state.now();
                let reaction = Reaction {
                    id: Uuid::new_v4(),
                    post_id,
                    author_id,
                    kind,
                    created_at: now,
                    updated_at: now,
                };
                state.reactions.push(reaction.clone());
                AppliedReaction::Created(reaction)
            }
            (transition, _) => {
                return Err(AppError::Internal(format!(
                    "reaction transition {:?} does not match stored state",
                    transition
                )))
            }
        };

        Ok(Some(applied))
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn get_profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorSummary>> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|u| (*id, u.summary())))
            .collect())
    }

    async fn update_post_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        match update {
            ListUpdate::Add => {
                if !user.posts.contains(&post_id) {
                    user.posts.push(post_id);
                }
            }
            ListUpdate::Remove => user.posts.retain(|id| *id != post_id),
        }
        Ok(())
    }

    async fn update_saved_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        let changed = match update {
            ListUpdate::Add if user.saved.contains(&post_id) => false,
            ListUpdate::Add => {
                user.saved.push(post_id);
                true
            }
            ListUpdate::Remove => {
                let before = user.saved.len();
                user.saved.retain(|id| *id != post_id);
                user.saved.len() < before
            }
        };
        Ok(changed)
    }

    async fn remove_saved_everywhere(&self, post_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut removed = 0;
        for user in state.users.values_mut() {
            let before = user.saved.len();
            user.saved.retain(|id| *id != post_id);
            removed += (before - user.saved.len()) as u64;
        }
        Ok(removed)
    }
}
