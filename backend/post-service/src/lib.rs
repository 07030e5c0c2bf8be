/// Post Service Library
///
/// Feed and interaction engine for the Nova social platform: posts, the
/// visibility-scoped feed, reactions, comments, saved posts and shares.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Posts, comments, reactions and their enriched views
/// - `services`: Business logic layer
/// - `db`: Content store trait with Postgres and in-memory implementations
/// - `identity`: Identity directory (profiles, friends, post and saved lists)
/// - `media`: Media store for uploaded images
/// - `middleware`: JWT authentication and request timing
/// - `resilience`: Deadlines and retry with backoff
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod resilience;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{EngineContext, FeedEngine};
