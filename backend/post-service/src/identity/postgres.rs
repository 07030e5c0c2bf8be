use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use super::IdentityDirectory;
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, ListUpdate, UserRecord};

/// Identity directory over the shared users schema.
///
/// Failures here are dependency failures, not store failures: the directory
/// is owned by the identity side of the platform.
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn directory_error(user_id: Option<Uuid>, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return AppError::NotFound(match user_id {
                Some(id) => format!("user {}", id),
                None => "user".to_string(),
            });
        }
    }
    AppError::Dependency(format!("identity directory: {}", err))
}

async fn fetch_id_list(pool: &PgPool, sql: &str, user_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| directory_error(Some(user_id), e))?;
    Ok(rows.into_iter().map(|row| row.get::<Uuid, _>(0)).collect())
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, username, profile_picture FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| directory_error(Some(user_id), e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let friends = fetch_id_list(
            &self.pool,
            "SELECT friend_id FROM user_friends WHERE user_id = $1 ORDER BY created_at ASC",
            user_id,
        )
        .await?;
        let saved = fetch_id_list(
            &self.pool,
            "SELECT post_id FROM user_saved_posts WHERE user_id = $1 ORDER BY seq ASC",
            user_id,
        )
        .await?;
        let posts = fetch_id_list(
            &self.pool,
            "SELECT post_id FROM user_posts WHERE user_id = $1 ORDER BY seq ASC",
            user_id,
        )
        .await?;

        Ok(Some(UserRecord {
            id: row.get("id"),
            username: row.get("username"),
            profile_picture: row.get("profile_picture"),
            friends,
            saved,
            posts,
        }))
    }

    async fn get_profiles(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, AuthorSummary>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT id, username, profile_picture FROM users WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| directory_error(None, e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                (
                    id,
                    AuthorSummary {
                        id,
                        username: row.get("username"),
                        profile_picture: row.get("profile_picture"),
                    },
                )
            })
            .collect())
    }

    async fn update_post_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<()> {
        let query = match update {
            ListUpdate::Add => sqlx::query(
                "INSERT INTO user_posts (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            ),
            ListUpdate::Remove => {
                sqlx::query("DELETE FROM user_posts WHERE user_id = $1 AND post_id = $2")
            }
        };

        query
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| directory_error(Some(user_id), e))?;
        Ok(())
    }

    async fn update_saved_list(
        &self,
        user_id: Uuid,
        update: ListUpdate,
        post_id: Uuid,
    ) -> Result<bool> {
        let query = match update {
            ListUpdate::Add => sqlx::query(
                "INSERT INTO user_saved_posts (user_id, post_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            ),
            ListUpdate::Remove => {
                sqlx::query("DELETE FROM user_saved_posts WHERE user_id = $1 AND post_id = $2")
            }
        };

        let result = query
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| directory_error(Some(user_id), e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_saved_everywhere(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_saved_posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| directory_error(None, e))?;
        Ok(result.rows_affected())
    }
}
