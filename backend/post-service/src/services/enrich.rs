//! Read-only enrichment of posts, comments and reactions.
//!
//! All author profiles for a batch are resolved with one directory call and
//! all children with one query per collection. Nothing here writes.

use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use super::EngineContext;
use crate::error::Result;
use crate::models::{
    AuthorSummary, Comment, CommentView, OriginalPostSummary, Post, PostView, Reaction,
    ReactionView, Viewer,
};

fn author(profiles: &HashMap<Uuid, AuthorSummary>, id: Uuid) -> AuthorSummary {
    profiles
        .get(&id)
        .cloned()
        .unwrap_or_else(|| AuthorSummary::unknown(id))
}

async fn profiles_for(
    ctx: &EngineContext,
    ids: HashSet<Uuid>,
) -> Result<HashMap<Uuid, AuthorSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<Uuid> = ids.into_iter().collect();
    ctx.timed("identity.get_profiles", ctx.identity.get_profiles(&ids))
        .await
}

/// Enrich posts for `viewer`, keeping their order.
///
/// A share's original is summarized only while it exists and `viewer` may see it.
pub async fn enrich_posts(
    ctx: &EngineContext,
    viewer: &Viewer,
    posts: Vec<Post>,
) -> Result<Vec<PostView>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let comments = ctx
        .timed("store.comments_for_posts", ctx.store.comments_for_posts(&post_ids))
        .await?;
    let reactions = ctx
        .timed("store.reactions_for_posts", ctx.store.reactions_for_posts(&post_ids))
        .await?;

    let original_ids: Vec<Uuid> = posts
        .iter()
        .filter_map(|p| p.original_post_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let originals: HashMap<Uuid, Post> = if original_ids.is_empty() {
        HashMap::new()
    } else {
        ctx.timed("store.find_posts", ctx.store.find_posts(&original_ids))
            .await?
            .into_iter()
            .filter(|p| viewer.can_see(p))
            .map(|p| (p.id, p))
            .collect()
    };

    let mut author_ids: HashSet<Uuid> = posts.iter().map(|p| p.author_id).collect();
    author_ids.extend(comments.iter().map(|c| c.author_id));
    author_ids.extend(reactions.iter().map(|r| r.author_id));
    author_ids.extend(originals.values().map(|p| p.author_id));
    let profiles = profiles_for(ctx, author_ids).await?;

    let mut comments_by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for comment in comments {
        let post_id = comment.post_id;
        let summary = author(&profiles, comment.author_id);
        comments_by_post
            .entry(post_id)
            .or_default()
            .push(CommentView::new(comment, summary));
    }
    let mut reactions_by_post: HashMap<Uuid, Vec<ReactionView>> = HashMap::new();
    for reaction in reactions {
        let post_id = reaction.post_id;
        let summary = author(&profiles, reaction.author_id);
        reactions_by_post
            .entry(post_id)
            .or_default()
            .push(ReactionView::new(reaction, summary));
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let comments = comments_by_post.remove(&post.id).unwrap_or_default();
            let reactions = reactions_by_post.remove(&post.id).unwrap_or_default();
            let mut reaction_counts = BTreeMap::new();
            for reaction in &reactions {
                *reaction_counts.entry(reaction.kind.clone()).or_insert(0) += 1;
            }

            let original_post = post
                .original_post_id
                .and_then(|id| originals.get(&id))
                .map(|original| OriginalPostSummary {
                    id: original.id,
                    author: author(&profiles, original.author_id),
                    caption: original.caption.clone(),
                    image_url: original.image_url.clone(),
                    created_at: original.created_at,
                });

            PostView {
                id: post.id,
                author: author(&profiles, post.author_id),
                caption: post.caption,
                image_url: post.image_url,
                visibility: post.visibility,
                original_post_id: post.original_post_id,
                original_post,
                comments,
                reactions,
                reaction_counts,
                created_at: post.created_at,
                updated_at: post.updated_at,
            }
        })
        .collect())
}

pub async fn enrich_comments(
    ctx: &EngineContext,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.author_id).collect();
    let profiles = profiles_for(ctx, ids).await?;
    Ok(comments
        .into_iter()
        .map(|c| {
            let summary = author(&profiles, c.author_id);
            CommentView::new(c, summary)
        })
        .collect())
}

pub async fn enrich_reaction(ctx: &EngineContext, reaction: Reaction) -> Result<ReactionView> {
    let profiles = profiles_for(ctx, [reaction.author_id].into_iter().collect()).await?;
    let summary = author(&profiles, reaction.author_id);
    Ok(ReactionView::new(reaction, summary))
}
