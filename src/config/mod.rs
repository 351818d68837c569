use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub cookie: CookieConfig,
    pub security: SecurityConfig,
    pub paths: PathConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session cookie attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    pub key: String,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub expiry_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Signs session tokens. Never serialized back out.
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub bcrypt_cost: u32,
    pub admin_email: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub views_dir: PathBuf,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file backing the user store; in-memory when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session secret must not be empty (set COOKIE_SECRET)")]
    MissingSecret,
    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidBcryptCost(u32),
    #[error("cookie expiry must be positive, got {0}")]
    InvalidExpiry(i64),
}

const DEV_SECRET: &str = "dev-only-session-secret-change-me";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Cookie
        if let Ok(v) = env::var("SESSION_COOKIE_KEY") {
            self.cookie.key = v;
        }
        if let Ok(v) = env::var("COOKIE_PATH") {
            self.cookie.path = v;
        }
        if let Ok(v) = env::var("COOKIE_DOMAIN") {
            self.cookie.domain = Some(v).filter(|d| !d.is_empty());
        }
        if let Ok(v) = env::var("SECURE_COOKIE") {
            self.cookie.secure = v.parse().unwrap_or(self.cookie.secure);
        }
        if let Ok(v) = env::var("COOKIE_EXP") {
            self.cookie.expiry_secs = v.parse().unwrap_or(self.cookie.expiry_secs);
        }

        // Security
        if let Ok(v) = env::var("COOKIE_SECRET").or_else(|_| env::var("JWT_SECRET")) {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.security.admin_email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.admin_password = Some(v);
        }

        // Paths
        if let Ok(v) = env::var("VIEWS_DIR") {
            self.paths.views_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("STATIC_DIR") {
            self.paths.static_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("USERS_DB_FILE") {
            self.store.path = Some(PathBuf::from(v));
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.session_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        if self.cookie.expiry_secs <= 0 {
            return Err(ConfigError::InvalidExpiry(self.cookie.expiry_secs));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cookie: CookieConfig {
                key: "ExpressGeneratorTs".to_string(),
                path: "/".to_string(),
                domain: None,
                secure: false,
                http_only: true,
                expiry_secs: 3 * 24 * 60 * 60, // 3 days
            },
            security: SecurityConfig {
                session_secret: DEV_SECRET.to_string(),
                bcrypt_cost: bcrypt::DEFAULT_COST,
                admin_email: None,
                admin_password: None,
            },
            paths: PathConfig {
                views_dir: PathBuf::from("views"),
                static_dir: PathBuf::from("public"),
            },
            store: StoreConfig { path: None },
        }
    }

    /// Cheap hashing and a fixed secret.
    pub fn test() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Test;
        config.server.host = "127.0.0.1".to_string();
        config.security.session_secret = "test-session-secret".to_string();
        config.security.bcrypt_cost = 4;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.cookie.secure = true;
        // COOKIE_SECRET is required; validate() rejects the empty default.
        config.security.session_secret = String::new();
        config
    }
}
