use std::env;

/// Upper bound on the token lifetime (ten years).
pub const MAX_TOKEN_EXPIRATION_HOURS: i64 = 24 * 365 * 10;

/// Runtime configuration for the storage backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: local SQLite file)
    pub database_url: String,

    /// Root directory for file content (default: "./storage")
    pub storage_path: String,

    /// Lifetime of an issued session token in hours (default: 24)
    pub token_expiration_hours: i64,

    /// Period of the expired token sweep in hours (default: 6)
    pub token_cleanup_interval_hours: u64,

    /// Maximum request body size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,

    /// Bootstrap account created at startup when both are set
    pub default_user_login: Option<String>,
    pub default_user_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cloud_storage.db?mode=rwc".to_string(),
            storage_path: "./storage".to_string(),
            token_expiration_hours: 24,
            token_cleanup_interval_hours: 6,
            max_file_size: 100 * 1024 * 1024, // 100 MB
            allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://localhost:8081".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            default_user_login: None,
            default_user_password: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            storage_path: env::var("FILE_STORAGE_PATH").unwrap_or(default.storage_path),

            token_expiration_hours: env::var("TOKEN_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .map(|h| h.min(MAX_TOKEN_EXPIRATION_HOURS))
                .unwrap_or(default.token_expiration_hours),

            token_cleanup_interval_hours: env::var("TOKEN_CLEANUP_INTERVAL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &u64| *h > 0)
                .unwrap_or(default.token_cleanup_interval_hours),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            default_user_login: env::var("DEFAULT_USER_LOGIN").ok(),
            default_user_password: env::var("DEFAULT_USER_PASSWORD").ok(),
        }
    }

    /// Token lifetime as a chrono duration
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_expiration_hours.clamp(0, MAX_TOKEN_EXPIRATION_HOURS))
    }

    /// Sweep period as a std duration
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_cleanup_interval_hours.saturating_mul(3600))
    }
}
