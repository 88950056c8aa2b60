/// Configuration management for Blog Service
///
/// Configuration is read from environment variables (optionally seeded from a
/// `.env` file by the binary). Every value has a development default; a few
/// are mandatory or constrained when `APP_ENV=production`.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
    /// Feed configuration
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
    /// Number of HTTP worker threads
    pub workers: usize,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Min connections kept open
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Session lifetime in seconds
    pub ttl_secs: i64,
    /// Send the cookie over HTTPS only
    pub secure: bool,
}

/// Uploaded media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to
    pub root: PathBuf,
    /// URL prefix media is served under
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub page_size: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            // two weeks
            ttl_secs: 1_209_600,
            secure: false,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./media"),
            url_prefix: "/media".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { page_size: 3 }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) if production => {
                return Err("DATABASE_URL must be set in production".to_string())
            }
            Err(_) => "postgres://localhost/blog".to_string(),
        };

        let session_secure = parse_env_or_default("SESSION_COOKIE_SECURE", production)?;
        if production && !session_secure {
            return Err("SESSION_COOKIE_SECURE cannot be disabled in production".to_string());
        }

        let page_size: i64 = parse_env_or_default("FEED_PAGE_SIZE", FeedConfig::default().page_size)?;
        if page_size < 1 {
            return Err(format!("FEED_PAGE_SIZE must be positive, got {}", page_size));
        }

        let media_defaults = MediaConfig::default();

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", 8000)?,
                workers: parse_env_or_default("BLOG_SERVICE_WORKERS", 4)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_env_or_default("DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DB_MIN_CONNECTIONS", 1)?,
                connect_timeout_secs: parse_env_or_default("DB_CONNECT_TIMEOUT_SECS", 5)?,
                acquire_timeout_secs: parse_env_or_default("DB_ACQUIRE_TIMEOUT_SECS", 10)?,
            },
            session: SessionConfig {
                cookie_name: std::env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| SessionConfig::default().cookie_name),
                ttl_secs: parse_env_or_default("SESSION_TTL_SECS", SessionConfig::default().ttl_secs)?,
                secure: session_secure,
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(media_defaults.root),
                url_prefix: std::env::var("MEDIA_URL")
                    .map(|v| v.trim_end_matches('/').to_string())
                    .unwrap_or(media_defaults.url_prefix),
                max_upload_bytes: parse_env_or_default(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    media_defaults.max_upload_bytes,
                )?,
            },
            feed: FeedConfig { page_size },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
