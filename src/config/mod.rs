//! # Configuration
//!
//! Settings are layered: compiled-in defaults first, then environment
//! variables prefixed with `BOOKSTORE_`. Nested sections use a double
//! underscore, e.g. `BOOKSTORE_SMTP__HOST` or `BOOKSTORE_UPLOAD__MAX_BYTES`.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
const ENV_PREFIX: &str = "BOOKSTORE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Public address of the API, used in links inside emails
    pub base_url: String,

    pub database_url: String,

    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,

    pub rate_limit: RateLimitConfig,
    pub smtp: SmtpConfig,
    pub upload: UploadConfig,

    /// Seeded on startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts allowed per client IP per minute
    pub login_per_minute: u32,
    pub burst: u32,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the socket
    /// peer. Only enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// SMTP relay settings. An empty `host` disables SMTP and mail is only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpConfig {
    /// Whether a relay host is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory book photos are written to
    pub dir: String,
    /// URL prefix under which `dir` is served
    pub public_base_url: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    /// Pretty logs and relaxed secret checks.
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Production refuses the built-in JWT secret.
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
        .to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: "sqlite://data/bookstore.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24,
            rate_limit: RateLimitConfig {
                login_per_minute: 10,
                burst: 5,
                trust_proxy_headers: false,
            },
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_address: "Bookstore <no-reply@bookstore.local>".to_string(),
            },
            upload: UploadConfig {
                dir: "data/uploads".to_string(),
                public_base_url: "http://localhost:3000/uploads".to_string(),
                max_bytes: 5 * 1024 * 1024,
            },
            admin_email: None,
            admin_password: None,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Load defaults overlaid with `BOOKSTORE_*` environment variables.
    ///
    /// # Errors
    /// Fails when an environment value cannot be parsed into its field type.
    pub fn load() -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// # Errors
    /// Returns [`AppError::Config`] for settings that must not reach a
    /// running server.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET must be changed in production".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.upload.max_bytes == 0 {
            return Err(AppError::Config(
                "UPLOAD__MAX_BYTES must be positive".to_string(),
            ));
        }

        for (key, value) in [
            ("BASE_URL", &self.base_url),
            ("UPLOAD__PUBLIC_BASE_URL", &self.upload.public_base_url),
        ] {
            if !is_http_url(value) {
                return Err(AppError::Config(format!(
                    "{} must be an absolute http(s) URL, got '{}'",
                    key, value
                )));
            }
        }

        if self.rate_limit.login_per_minute == 0 {
            return Err(AppError::Config(
                "RATE_LIMIT__LOGIN_PER_MINUTE must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// `host:port` to bind, e.g. `127.0.0.1:3000`.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Admin credentials to seed, if both halves are configured.
    #[must_use]
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

// =====================================
// Builder
// =====================================
/// Fluent construction, mostly for tests.
///
/// ```rust
/// use bookstore::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .host("0.0.0.0")
///     .build();
/// assert_eq!(config.server_addr(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from [`Config::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Listening port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Bind address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Public base URL used in email links.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// SQLite connection string, e.g. `sqlite::memory:`.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    /// HMAC secret for access tokens.
    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    /// Login quota per client: `per_minute` replenishment with a `burst` allowance.
    #[must_use]
    pub fn login_rate_limit(mut self, per_minute: u32, burst: u32) -> Self {
        self.config.rate_limit.login_per_minute = per_minute;
        self.config.rate_limit.burst = burst;
        self
    }

    /// Key login throttling on forwarding headers, see [`RateLimitConfig::trust_proxy_headers`].
    #[must_use]
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.config.rate_limit.trust_proxy_headers = trust;
        self
    }

    /// Directory photos are stored in.
    #[must_use]
    pub fn upload_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.upload.dir = dir.into();
        self
    }

    /// Largest accepted photo, in bytes.
    #[must_use]
    pub fn upload_max_bytes(mut self, max_bytes: usize) -> Self {
        self.config.upload.max_bytes = max_bytes;
        self
    }

    /// Credentials of the admin account seeded at startup.
    #[must_use]
    pub fn admin(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.admin_email = Some(email.into());
        self.config.admin_password = Some(password.into());
        self
    }

    /// Deployment environment; affects log format and secret validation.
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// Finish without validating.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// # Errors
    /// See [`Config::validate`].
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert!(!config.smtp.is_enabled());
        assert!(config.admin_seed().is_none());
        assert!(!config.rate_limit.trust_proxy_headers);
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from("PROD".to_string()), Environment::Production);
        assert_eq!(Environment::from("test".to_string()), Environment::Testing);
        assert_eq!(Environment::from("whatever".to_string()), Environment::Development);
    }

    #[test]
    fn test_environment_serde_round_trip() {
        let json = serde_json::to_string(&Environment::Production).unwrap();
        assert_eq!(json, "\"production\"");
        let back: Environment = serde_json::from_str("\"Prod\"").unwrap();
        assert_eq!(back, Environment::Production);
    }

    #[test]
    fn test_validation_fails_in_production_with_default_secret() {
        let config = ConfigBuilder::new()
            .environment(Environment::Production)
            .build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new()
            .environment(Environment::Production)
            .jwt_secret("a-real-secret")
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_upload_limit() {
        let result = ConfigBuilder::new().upload_max_bytes(0).build_validated();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_relative_base_url() {
        let result = ConfigBuilder::new().base_url("/shop").build_validated();
        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(ConfigBuilder::new().base_url("https://books.example.com").build_validated().is_ok());
    }

    #[test]
    fn test_admin_seed_requires_both_halves() {
        let mut config = ConfigBuilder::new().admin("root@shop.test", "password1").build();
        assert_eq!(config.admin_seed(), Some(("root@shop.test", "password1")));

        config.admin_password = Some(String::new());
        assert!(config.admin_seed().is_none());
    }

    #[test]
    fn test_load_uses_defaults_without_env() {
        let config = Config::load().unwrap();
        assert_eq!(config.upload.max_bytes, Config::default().upload.max_bytes);
    }
}
