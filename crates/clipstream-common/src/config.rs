//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults
//!
//! The loaded [`AppConfig`] is an ordinary value. It is built once by the binary
//! and handed to whatever needs it; nothing reads configuration from a global.

use serde::Deserialize;

/// Minimum length (in bytes) accepted for a token signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound for either token lifetime (365 days).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Load configuration from defaults, an optional config file, `.env`, and the
/// environment, then validate it.
///
/// `file` is the config file stem or path (e.g. `"config"` picks up
/// `config.toml` in the working directory). It is optional on disk.
pub fn load(file: &str) -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.body_limit_bytes", 16 * 1024)?
        .set_default("database.url", "memory://")?
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 1)?
        .set_default("auth.access_token_ttl_secs", 900)? // 15 min
        .set_default("auth.refresh_token_ttl_secs", 864_000)? // 10 days
        .set_default("cookies.secure", true)?
        .set_default("cookies.same_site", "strict")?
        // Optional config file
        .add_source(config::File::with_name(file).required(false))
        // Environment variables (CLIPSTREAM__SERVER__PORT, CLIPSTREAM__AUTH__ACCESS_TOKEN_SECRET, etc.)
        .add_source(
            config::Environment::with_prefix("CLIPSTREAM")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cookies: CookieConfig,
}

impl AppConfig {
    /// Reject configurations the service must not start with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.auth.validate()?;
        self.cookies.validate()?;
        if let Some(origin) = &self.server.cors_origin {
            if origin.parse::<axum::http::HeaderValue>().is_err() || origin == "*" {
                return Err(config::ConfigError::Message(format!(
                    "server.cors_origin {origin:?} must be a single explicit origin"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Single allowed browser origin. When set, CORS allows credentials for it.
    pub cors_origin: Option<String>,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `postgres://…` for PostgreSQL, `memory://` for the in-process store.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory:")
    }
}

/// Token signing material and lifetimes.
///
/// Access and refresh tokens are signed with different secrets so that one
/// kind can never be accepted in place of the other.
#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret for access tokens
    pub access_token_secret: String,
    /// HS256 secret for refresh tokens
    pub refresh_token_secret: String,
    /// Access token TTL in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token TTL in seconds
    pub refresh_token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        for (name, secret) in [
            ("auth.access_token_secret", &self.access_token_secret),
            ("auth.refresh_token_secret", &self.refresh_token_secret),
        ] {
            if secret.trim().len() < MIN_SECRET_LEN {
                return Err(config::ConfigError::Message(format!(
                    "{name} must be set and at least {MIN_SECRET_LEN} bytes long"
                )));
            }
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(config::ConfigError::Message(
                "auth.access_token_secret and auth.refresh_token_secret must differ".into(),
            ));
        }

        if self.access_token_ttl_secs == 0 || self.refresh_token_ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "token lifetimes must be greater than zero".into(),
            ));
        }

        if self.refresh_token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(config::ConfigError::Message(format!(
                "auth.refresh_token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS}"
            )));
        }

        if self.access_token_ttl_secs >= self.refresh_token_ttl_secs {
            return Err(config::ConfigError::Message(
                "auth.access_token_ttl_secs must be shorter than auth.refresh_token_ttl_secs"
                    .into(),
            ));
        }

        Ok(())
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}

/// `SameSite` policy for the token cookies.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    /// Mark token cookies `Secure` (HTTPS only)
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl CookieConfig {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        // Browsers drop `SameSite=None` cookies that are not also `Secure`.
        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(config::ConfigError::Message(
                "cookies.same_site = \"none\" requires cookies.secure = true".into(),
            ));
        }
        Ok(())
    }
}
