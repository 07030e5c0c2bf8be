use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::FeedEngine;

/// Toggle the post in the caller's saved list and return the whole list
pub async fn toggle_save(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let response = engine.saves.toggle_save(user_id.0, *post_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get_saved(engine: web::Data<FeedEngine>, user_id: UserId) -> Result<HttpResponse> {
    let saved = engine.saves.saved_posts(user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "saved_posts": saved })))
}
