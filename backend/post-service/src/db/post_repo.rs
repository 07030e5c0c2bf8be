use crate::models::{NewPost, Post, Visibility};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, seq, author_id, caption, image_url, visibility, original_post_id, \
                            created_at, updated_at";

/// Row shape of the `posts` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub seq: i64,
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub visibility: String,
    pub original_post_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    /// Convert into a domain post; reference lists are filled by the caller.
    pub fn into_post(self) -> Result<Post, crate::error::AppError> {
        let visibility: Visibility = self.visibility.parse().map_err(|_| {
            crate::error::AppError::Internal(format!(
                "post {} has unknown visibility '{}'",
                self.id, self.visibility
            ))
        })?;

        Ok(Post {
            id: self.id,
            author_id: self.author_id,
            caption: self.caption,
            image_url: self.image_url,
            visibility,
            original_post_id: self.original_post_id,
            comment_ids: Vec::new(),
            reaction_ids: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert a new post and return the stored row
pub async fn insert_post<'e, E>(executor: E, new_post: &NewPost) -> Result<PostRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO posts (id, author_id, caption, image_url, visibility, original_post_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        POST_COLUMNS
    );

    sqlx::query_as::<_, PostRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(new_post.author_id)
        .bind(new_post.caption.as_deref())
        .bind(new_post.image_url.as_deref())
        .bind(new_post.visibility.as_str())
        .bind(new_post.original_post_id)
        .fetch_one(executor)
        .await
}

/// Find a post by ID
pub async fn find_post_by_id<'e, E>(executor: E, post_id: Uuid) -> Result<Option<PostRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(executor)
        .await
}

/// Find several posts; order is not guaranteed
pub async fn find_posts_by_ids<'e, E>(
    executor: E,
    post_ids: &[Uuid],
) -> Result<Vec<PostRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {} FROM posts WHERE id = ANY($1)", POST_COLUMNS);
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_ids)
        .fetch_all(executor)
        .await
}

/// Take an exclusive row lock on a post for the rest of the transaction.
/// Returns false if the post does not exist.
pub async fn lock_post_for_update<'e, E>(executor: E, post_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
        .bind(post_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// Take a shared row lock so the post cannot be deleted until commit.
pub async fn lock_post_for_share<'e, E>(executor: E, post_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query("SELECT id FROM posts WHERE id = $1 FOR SHARE")
        .bind(post_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// Hard delete a post row
pub async fn delete_post<'e, E>(executor: E, post_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Posts visible to a viewer, newest first.
///
/// Public posts, friends-only posts whose author is in `friend_ids`, and every
/// post the viewer authored. Equal timestamps fall back to insertion order.
pub async fn find_visible_posts<'e, E>(
    executor: E,
    viewer_id: Uuid,
    friend_ids: &[Uuid],
    limit: i64,
    offset: i64,
) -> Result<Vec<PostRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {}
        FROM posts
        WHERE visibility = 'public'
           OR (visibility = 'friends' AND author_id = ANY($2))
           OR author_id = $1
        ORDER BY created_at DESC, seq ASC
        LIMIT $3 OFFSET $4
        "#,
        POST_COLUMNS
    );

    sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer_id)
        .bind(friend_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}
