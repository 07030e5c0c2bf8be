/// Feed service - visibility-scoped feed and single-post reads
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use super::enrich::enrich_posts;
use super::EngineContext;
use crate::error::{AppError, Result};
use crate::metrics::engine::{FEED_REQUESTS_TOTAL, FEED_SIZE, OPERATION_DURATION_SECONDS};
use crate::models::{FeedResponse, Page, PostView};

const CURSOR_PREFIX: &str = "offset:";

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Opaque cursor for the next page.
pub fn encode_cursor(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}{}", CURSOR_PREFIX, offset))
}

pub fn decode_cursor(cursor: &str) -> Result<usize> {
    let invalid = || AppError::Validation("invalid feed cursor".to_string());
    let bytes = URL_SAFE_NO_PAD.decode(cursor.trim()).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    // Offsets are bound as BIGINT
    text.strip_prefix(CURSOR_PREFIX)
        .and_then(|n| n.parse::<i64>().ok())
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(invalid)
}

#[derive(Clone)]
pub struct FeedService {
    ctx: EngineContext,
}

impl FeedService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Posts the viewer may see, newest first, enriched.
    pub async fn get_feed(&self, viewer_id: Uuid, query: FeedQuery) -> Result<FeedResponse> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["get_feed"])
            .start_timer();
        FEED_REQUESTS_TOTAL.inc();

        let limit = query
            .limit
            .unwrap_or(self.ctx.feed.default_limit)
            .clamp(1, self.ctx.feed.max_limit);
        let offset = match query.cursor.as_deref() {
            Some(cursor) if !cursor.trim().is_empty() => decode_cursor(cursor)?,
            _ => 0,
        };

        let user = self.ctx.require_user(viewer_id).await?;
        let viewer = user.viewer();

        // One extra row tells us whether another page exists
        let mut posts = self
            .ctx
            .timed(
                "store.visible_posts",
                self.ctx
                    .store
                    .visible_posts(viewer_id, &user.friends, Page::new(offset, limit + 1)),
            )
            .await?;
        let has_more = posts.len() > limit;
        posts.truncate(limit);

        let views = enrich_posts(&self.ctx, &viewer, posts).await?;
        FEED_SIZE.observe(views.len() as f64);
        debug!(%viewer_id, offset, returned = views.len(), has_more, "feed assembled");

        Ok(FeedResponse {
            cursor: has_more.then(|| encode_cursor(offset + limit)),
            posts: views,
            has_more,
        })
    }

    /// A single enriched post, or `NotFound` if it is missing or hidden from
    /// the viewer.
    pub async fn get_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<PostView> {
        let user = self.ctx.require_user(viewer_id).await?;
        let viewer = user.viewer();

        let post = self.ctx.require_visible_post(&viewer, post_id).await?;

        enrich_posts(&self.ctx, &viewer, vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("enrichment dropped a post".to_string()))
    }
}
