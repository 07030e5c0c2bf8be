use crate::models::Comment;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Create a new comment
pub async fn insert_comment<'e, E>(
    executor: E,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> Result<CommentRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CommentRow>(
        r#"
        INSERT INTO comments (id, post_id, author_id, text)
        VALUES ($1, $2, $3, $4)
        RETURNING id, post_id, author_id, text, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(executor)
    .await
}

/// Get a comment by ID
pub async fn find_comment<'e, E>(executor: E, comment_id: Uuid) -> Result<Option<CommentRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CommentRow>(
        "SELECT id, post_id, author_id, text, created_at FROM comments WHERE id = $1",
    )
    .bind(comment_id)
    .fetch_optional(executor)
    .await
}

/// Comments for a set of posts in creation order
pub async fn find_comments_for_posts<'e, E>(
    executor: E,
    post_ids: &[Uuid],
) -> Result<Vec<CommentRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, post_id, author_id, text, created_at
        FROM comments
        WHERE post_id = ANY($1)
        ORDER BY created_at ASC, seq ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await
}

/// Delete one comment
pub async fn delete_comment<'e, E>(executor: E, comment_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every comment on a post
pub async fn delete_comments_for_post<'e, E>(executor: E, post_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
