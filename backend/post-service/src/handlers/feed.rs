use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::{FeedEngine, FeedQuery};

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

pub async fn get_feed(
    engine: web::Data<FeedEngine>,
    user_id: UserId,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let feed = engine
        .feed
        .get_feed(
            user_id.0,
            FeedQuery {
                limit: query.limit,
                cursor: query.cursor,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(feed))
}
