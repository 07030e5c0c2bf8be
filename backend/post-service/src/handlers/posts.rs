/// Post handlers - HTTP endpoints for post operations
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{Visibility, MAX_CAPTION_LEN};
use crate::services::{CreatePostInput, FeedEngine, ImageUpload};

/// Upper bound on image bytes read from a multipart body.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

impl Default for UploadLimit {
    fn default() -> Self {
        Self(10 * 1024 * 1024)
    }
}

async fn read_text(field: &mut actix_multipart::Field, name: &str) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Validation(format!("Multipart read error: {}", e)))?;
        data.extend_from_slice(&chunk);
        if data.len() > MAX_CAPTION_LEN * 4 {
            return Err(AppError::Validation(format!("field '{}' is too large", name)));
        }
    }
    String::from_utf8(data)
        .map_err(|_| AppError::Validation(format!("field '{}' is not valid UTF-8", name)))
}

/// Create a new post
///
/// Multipart fields: `caption`, `visibility`, `image`.
pub async fn create_post(
    engine: web::Data<FeedEngine>,
    limit: Option<web::Data<UploadLimit>>,
    user_id: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let max_bytes = limit.map(|l| l.0).unwrap_or_else(|| UploadLimit::default().0);
    let mut input = CreatePostInput::default();

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "caption" => input.caption = Some(read_text(&mut field, "caption").await?),
            "visibility" => {
                let raw = read_text(&mut field, "visibility").await?;
                if !raw.trim().is_empty() {
                    input.visibility = Some(raw.parse::<Visibility>()?);
                }
            }
            "image" => {
                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk
                        .map_err(|e| AppError::Validation(format!("Image read error: {}", e)))?;
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() > max_bytes {
                        return Err(AppError::Validation(format!(
                            "image exceeds {} bytes",
                            max_bytes
                        )));
                    }
                }
                if !bytes.is_empty() {
                    input.image = Some(ImageUpload {
                        bytes,
                        content_type,
                    });
                }
            }
            _ => {
                // Drain unknown fields
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
                }
            }
        }
    }

    let post = engine.posts.create_post(user_id.0, input).await?;
    Ok(HttpResponse::Created().json(post))
}

/// Get a post by ID, enriched, if the caller may see it
pub async fn get_post(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let view = engine.feed.get_post(user_id.0, *post_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Delete a post (author only) with its comments and reactions
pub async fn delete_post(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let deletion = engine.posts.delete_post(*post_id, user_id.0).await?;
    Ok(HttpResponse::Ok().json(deletion))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SharePostRequest {
    #[validate(length(max = 2200))]
    pub caption: Option<String>,
}

/// Share (repost) a post
pub async fn share_post(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    body: Option<web::Json<SharePostRequest>>,
) -> Result<HttpResponse> {
    let req = body.map(|b| b.into_inner()).unwrap_or_default();
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let share = engine
        .saves
        .share_post(user_id.0, *post_id, req.caption)
        .await?;
    Ok(HttpResponse::Created().json(share))
}

/// Drop deleted posts from the caller's post list
pub async fn reconcile_posts(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let removed = engine.posts.reconcile_author_posts(user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}
