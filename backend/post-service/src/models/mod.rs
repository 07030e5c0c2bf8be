/// Data models for post-service
///
/// This module defines structures for:
/// - Post: published or shared posts, with derived comment/reaction references
/// - Comment: append-only comments on a post
/// - Reaction: one typed reaction per (author, post)
/// - UserRecord / AuthorSummary: what the identity directory hands us
/// - *View: enriched, read-only response shapes
pub mod reaction;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

pub use reaction::{AppliedReaction, ReactionState, ReactionTransition};

pub const MAX_CAPTION_LEN: usize = 2_200;
pub const MAX_COMMENT_LEN: usize = 2_200;
pub const MAX_REACTION_TYPE_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Friends => "friends",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "friends" => Ok(Visibility::Friends),
            "private" => Ok(Visibility::Private),
            other => Err(AppError::Validation(format!(
                "visibility must be one of public, friends, private (got '{}')",
                other
            ))),
        }
    }
}

/// Stored post.
///
/// `comment_ids` and `reaction_ids` are derived from the comment and reaction
/// collections at read time, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub visibility: Visibility,
    pub original_post_id: Option<Uuid>,
    pub comment_ids: Vec<Uuid>,
    pub reaction_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_share(&self) -> bool {
        self.original_post_id.is_some()
    }
}

/// Input for the post store's create operation.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub visibility: Visibility,
    pub original_post_id: Option<Uuid>,
}

impl NewPost {
    /// Build a post, normalizing blank captions to absent and enforcing the
    /// "caption, image or share source" invariant.
    pub fn new(
        author_id: Uuid,
        caption: Option<String>,
        image_url: Option<String>,
        visibility: Option<Visibility>,
        original_post_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let caption = normalize_text(caption);
        let image_url = normalize_text(image_url);

        if caption.is_none() && image_url.is_none() && original_post_id.is_none() {
            return Err(AppError::Validation(
                "a post needs a caption, an image, or an original post to share".to_string(),
            ));
        }

        check_caption(caption.as_deref())?;

        Ok(Self {
            author_id,
            caption,
            image_url,
            visibility: visibility.unwrap_or_default(),
            original_post_id,
        })
    }
}

pub fn check_caption(caption: Option<&str>) -> Result<(), AppError> {
    match caption {
        Some(caption) if caption.chars().count() > MAX_CAPTION_LEN => Err(AppError::Validation(
            format!("caption exceeds {} characters", MAX_CAPTION_LEN),
        )),
        _ => Ok(()),
    }
}

/// Trim and drop empty strings.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as resolved by the identity directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
    pub friends: Vec<Uuid>,
    pub saved: Vec<Uuid>,
    pub posts: Vec<Uuid>,
}

impl UserRecord {
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            id: self.id,
            friends: self.friends.iter().copied().collect(),
        }
    }
}

/// Public profile fields attached to enriched entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl AuthorSummary {
    /// Used when the directory no longer knows the author.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            username: String::new(),
            profile_picture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListUpdate {
    Add,
    Remove,
}

/// The requesting user plus the friend whitelist that scopes visibility.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub id: Uuid,
    pub friends: HashSet<Uuid>,
}

impl Viewer {
    /// Public, friends-of-viewer, or the viewer's own post.
    pub fn can_see(&self, post: &Post) -> bool {
        match post.visibility {
            Visibility::Public => true,
            _ if post.author_id == self.id => true,
            Visibility::Friends => self.friends.contains(&post.author_id),
            Visibility::Private => false,
        }
    }
}

/// Offset window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(Self::DEFAULT_LIMIT)
    }
}

/// What a cascade delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub comments_removed: u64,
    pub reactions_removed: u64,
}

// =====================================================================
// Enriched views
// =====================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorSummary) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            text: comment.text,
            author,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionView {
    pub id: Uuid,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReactionView {
    pub fn new(reaction: Reaction, author: AuthorSummary) -> Self {
        Self {
            id: reaction.id,
            post_id: reaction.post_id,
            kind: reaction.kind,
            author,
            created_at: reaction.created_at,
            updated_at: reaction.updated_at,
        }
    }
}

/// Summary of the post a share points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalPostSummary {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub visibility: Visibility,
    pub original_post_id: Option<Uuid>,
    /// Absent when the original was deleted or is not visible to the viewer
    pub original_post: Option<OriginalPostSummary>,
    pub comments: Vec<CommentView>,
    pub reactions: Vec<ReactionView>,
    pub reaction_counts: BTreeMap<String, usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostView>,
    pub cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveToggleResponse {
    pub saved: bool,
    pub saved_posts: Vec<PostView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: Uuid, visibility: Visibility) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id: author,
            caption: Some("hello".into()),
            image_url: None,
            visibility,
            original_post_id: None,
            comment_ids: vec![],
            reaction_ids: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_post_requires_some_content() {
        let author = Uuid::new_v4();
        let err = NewPost::new(author, None, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = NewPost::new(author, Some("   ".into()), Some("".into()), None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn share_needs_no_caption_or_image() {
        let post = NewPost::new(Uuid::new_v4(), Some("".into()), None, None, Some(Uuid::new_v4()))
            .unwrap();
        assert!(post.caption.is_none());
        assert_eq!(post.visibility, Visibility::Public);
    }

    #[test]
    fn oversized_caption_is_rejected() {
        let caption = "x".repeat(MAX_CAPTION_LEN + 1);
        let err = NewPost::new(Uuid::new_v4(), Some(caption), None, None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn visibility_parses_case_insensitively() {
        assert_eq!("Friends".parse::<Visibility>().unwrap(), Visibility::Friends);
        assert!("everyone".parse::<Visibility>().is_err());
    }

    #[test]
    fn viewer_visibility_predicate() {
        let viewer_id = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let viewer = Viewer {
            id: viewer_id,
            friends: [friend].into_iter().collect(),
        };

        assert!(viewer.can_see(&post(stranger, Visibility::Public)));
        assert!(viewer.can_see(&post(friend, Visibility::Friends)));
        assert!(!viewer.can_see(&post(stranger, Visibility::Friends)));
        assert!(!viewer.can_see(&post(friend, Visibility::Private)));
        assert!(viewer.can_see(&post(viewer_id, Visibility::Private)));
        assert!(viewer.can_see(&post(viewer_id, Visibility::Friends)));
    }
}
