use crate::models::Reaction;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReactionRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReactionRow> for Reaction {
    fn from(row: ReactionRow) -> Self {
        Reaction {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            kind: row.reaction_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// The (author, post) reaction, if any
pub async fn find_reaction<'e, E>(
    executor: E,
    post_id: Uuid,
    author_id: Uuid,
) -> Result<Option<ReactionRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReactionRow>(
        r#"
        SELECT id, post_id, author_id, reaction_type, created_at, updated_at
        FROM reactions
        WHERE post_id = $1 AND author_id = $2
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .fetch_optional(executor)
    .await
}

/// Create a reaction. The unique (author_id, post_id) index rejects duplicates.
pub async fn insert_reaction<'e, E>(
    executor: E,
    post_id: Uuid,
    author_id: Uuid,
    kind: &str,
) -> Result<ReactionRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReactionRow>(
        r#"
        INSERT INTO reactions (id, post_id, author_id, reaction_type)
        VALUES ($1, $2, $3, $4)
        RETURNING id, post_id, author_id, reaction_type, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(author_id)
    .bind(kind)
    .fetch_one(executor)
    .await
}

/// Overwrite the type in place, keeping id and created_at
pub async fn update_reaction_type<'e, E>(
    executor: E,
    reaction_id: Uuid,
    kind: &str,
) -> Result<ReactionRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReactionRow>(
        r#"
        UPDATE reactions
        SET reaction_type = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, post_id, author_id, reaction_type, created_at, updated_at
        "#,
    )
    .bind(kind)
    .bind(reaction_id)
    .fetch_one(executor)
    .await
}

pub async fn delete_reaction<'e, E>(executor: E, reaction_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM reactions WHERE id = $1")
        .bind(reaction_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Reactions for a set of posts in creation order
pub async fn find_reactions_for_posts<'e, E>(
    executor: E,
    post_ids: &[Uuid],
) -> Result<Vec<ReactionRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReactionRow>(
        r#"
        SELECT id, post_id, author_id, reaction_type, created_at, updated_at
        FROM reactions
        WHERE post_id = ANY($1)
        ORDER BY created_at ASC, seq ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await
}

pub async fn delete_reactions_for_post<'e, E>(executor: E, post_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM reactions WHERE post_id = $1")
        .bind(post_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
