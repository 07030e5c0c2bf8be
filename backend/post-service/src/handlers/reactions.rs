use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::{FeedEngine, ReactionOutcome};

#[derive(Debug, Deserialize, Validate)]
pub struct ReactRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub kind: String,
}

/// React to a post; the same type twice removes the reaction
pub async fn react(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<ReactRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = engine.reactions.react(user_id.0, *post_id, &req.kind).await?;
    Ok(match outcome {
        ReactionOutcome::Created { .. } => HttpResponse::Created().json(outcome),
        _ => HttpResponse::Ok().json(outcome),
    })
}
