/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::FeedEngine;

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2200))]
    pub text: String,
}

pub async fn add_comment(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<AddCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = engine
        .comments
        .add_comment(user_id.0, *post_id, &req.text)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn list_comments(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = engine.comments.list_comments(user_id.0, *post_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn delete_comment(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    engine
        .comments
        .delete_comment(*comment_id, user_id.0)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
