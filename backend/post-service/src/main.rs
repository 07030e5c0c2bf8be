use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use chrono::Utc;
use post_service::config::{Config, StorageBackend};
use post_service::db::{ContentStore, InMemoryStore, PgContentStore};
use post_service::handlers::{self, UploadLimit};
use post_service::identity::{IdentityDirectory, PgIdentityDirectory};
use post_service::media::{InMemoryMediaStore, MediaStore, S3MediaStore};
use post_service::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use post_service::{EngineContext, FeedEngine};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    store: &'static str,
    message: String,
    latency_ms: u64,
    timestamp: String,
}

async fn health_summary(engine: web::Data<FeedEngine>) -> HttpResponse {
    match engine.health_check().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
            "service": "post-service"
        })),
    }
}

async fn readiness_summary(engine: web::Data<FeedEngine>) -> HttpResponse {
    let start = Instant::now();
    let result = engine.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, message) = match result {
        Ok(_) => (true, "content store reachable".to_string()),
        Err(e) => (false, format!("content store check failed: {}", e)),
    };
    let response = ReadinessResponse {
        ready,
        store: if ready { "healthy" } else { "unhealthy" },
        message,
        latency_ms,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ContentStore>, Arc<dyn IdentityDirectory>)> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
                .connect(&config.database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!(
                "Database pool initialized with {} max connections",
                config.database.max_connections
            );

            if config.database.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations applied");
            }

            Ok((
                Arc::new(PgContentStore::new(pool.clone())),
                Arc::new(PgIdentityDirectory::new(pool)),
            ))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone(), store))
        }
    }
}

async fn build_media(config: &Config) -> Arc<dyn MediaStore> {
    match &config.media.s3_bucket {
        Some(bucket) => {
            info!(bucket = %bucket, "Using S3 media store");
            Arc::new(S3MediaStore::from_env(&config.media, bucket.clone()).await)
        }
        None => {
            warn!("MEDIA_S3_BUCKET not set; images are kept in process memory");
            Arc::new(InMemoryMediaStore::new(
                config.media.public_base_url.clone(),
                config.media.max_image_bytes,
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let (store, identity) = build_stores(&config).await?;
    let media = build_media(&config).await;

    let ctx = EngineContext::new(store, identity, media)
        .with_request_config(&config.request)
        .with_feed_config(config.feed.clone());
    let engine = web::Data::new(FeedEngine::new(ctx));
    let upload_limit = web::Data::new(UploadLimit(config.media.max_image_bytes));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let jwt_secret = config.auth.jwt_secret.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(engine.clone())
            .app_data(upload_limit.clone())
            .app_data(handlers::json_config())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(post_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(&jwt_secret))
                    .wrap(MetricsMiddleware)
                    .configure(handlers::configure),
            )
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    error!("HTTP server error: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("HTTP server task join error: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    info!("post-service shut down");
    Ok(())
}
