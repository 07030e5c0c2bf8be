/// Configuration management for Post Service
///
/// This module handles loading configuration from environment variables
/// (a `.env` file is loaded by `main` through dotenvy first).
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Which content store backs the engine
    pub storage: StorageConfig,
    /// Media store configuration
    pub media: MediaConfig,
    /// JWT verification
    pub auth: AuthConfig,
    /// Deadlines and compensation retries
    pub request: RequestConfig,
    /// Feed paging
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory' (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Media store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// S3 bucket; without one images are kept in process memory
    pub s3_bucket: Option<String>,
    /// Base URL images are served from
    pub public_base_url: String,
    pub max_image_bytes: usize,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    pub store_timeout_ms: u64,
    pub compensation_retry_attempts: u32,
    pub compensation_retry_backoff_ms: u64,
}

impl RequestConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn compensation_backoff(&self) -> Duration {
        Duration::from_millis(self.compensation_retry_backoff_ms)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 3_000,
            compensation_retry_attempts: 3,
            compensation_retry_backoff_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let cors = {
            let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };
        if production && backend == StorageBackend::Memory {
            return Err("STORAGE_BACKEND=memory is not allowed in production".to_string());
        }

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if production => return Err("JWT_SECRET must be set in production".to_string()),
            _ => "dev-only-post-service-secret".to_string(),
        };

        let s3_bucket = lookup("MEDIA_S3_BUCKET").filter(|b| !b.trim().is_empty());
        if production && s3_bucket.is_none() {
            return Err("MEDIA_S3_BUCKET must be set in production".to_string());
        }

        let feed = FeedConfig {
            default_limit: parse_or(&lookup, "FEED_DEFAULT_LIMIT", 20)?,
            max_limit: parse_or(&lookup, "FEED_MAX_LIMIT", 100)?,
        };
        if feed.default_limit == 0 || feed.default_limit > feed.max_limit {
            return Err(format!(
                "FEED_DEFAULT_LIMIT must be between 1 and FEED_MAX_LIMIT ({})",
                feed.max_limit
            ));
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: lookup("POST_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "POST_SERVICE_PORT", 8085)?,
            },
            cors,
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/nova".to_string()),
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                acquire_timeout_secs: parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
                run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            },
            storage: StorageConfig { backend },
            media: MediaConfig {
                s3_bucket,
                public_base_url: lookup("MEDIA_PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:8085/media".to_string()),
                max_image_bytes: parse_or(&lookup, "MEDIA_MAX_IMAGE_BYTES", 10 * 1024 * 1024)?,
                key_prefix: lookup("MEDIA_KEY_PREFIX").unwrap_or_else(|| "posts/".to_string()),
            },
            auth: AuthConfig { jwt_secret },
            request: RequestConfig {
                store_timeout_ms: parse_or(&lookup, "STORE_TIMEOUT_MS", 3_000)?,
                compensation_retry_attempts: parse_or(&lookup, "COMPENSATION_RETRY_ATTEMPTS", 3)?,
                compensation_retry_backoff_ms: parse_or(
                    &lookup,
                    "COMPENSATION_RETRY_BACKOFF_MS",
                    50,
                )?,
            },
            feed,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_outside_production() {
        let config = load(&[]).unwrap();
        assert_eq!(config.app.port, 8085);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.request.store_timeout_ms, 3_000);
        assert_eq!(config.feed.default_limit, 20);
        assert_eq!(config.media.key_prefix, "posts/");
        assert!(config.media.s3_bucket.is_none());
    }

    #[test]
    fn production_requires_secret_and_origins() {
        let err = load(&[("APP_ENV", "production")]).unwrap_err();
        assert!(err.contains("CORS_ALLOWED_ORIGINS"));

        let err = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://nova.app"),
        ])
        .unwrap_err();
        assert!(err.contains("JWT_SECRET"));
    }

    #[test]
    fn production_rejects_memory_backend() {
        let err = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://nova.app"),
            ("JWT_SECRET", "s3cret"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap_err();
        assert!(err.contains("STORAGE_BACKEND"));
    }

    #[test]
    fn production_requires_media_bucket() {
        let base = [
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://nova.app"),
            ("JWT_SECRET", "s3cret"),
        ];
        let err = load(&base).unwrap_err();
        assert!(err.contains("MEDIA_S3_BUCKET"));

        let mut vars = base.to_vec();
        vars.push(("MEDIA_S3_BUCKET", "nova-post-media"));
        let config = load(&vars).unwrap();
        assert!(config.app.is_production());
        assert_eq!(config.media.s3_bucket.as_deref(), Some("nova-post-media"));
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let err = load(&[("STORE_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(err.contains("STORE_TIMEOUT_MS"));
    }

    #[test]
    fn default_limit_must_fit_max() {
        let err = load(&[("FEED_DEFAULT_LIMIT", "200"), ("FEED_MAX_LIMIT", "100")]).unwrap_err();
        assert!(err.contains("FEED_DEFAULT_LIMIT"));
    }
}
