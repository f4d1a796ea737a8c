use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub api_max: u32,
    pub auth_max: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            api_max: 100,
            auth_max: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-process memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub workers: usize,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Fails when `JWT_SECRET` is
    /// absent or empty; everything else has a default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let jwt = JwtConfig {
            secret,
            issuer: text("JWT_ISSUER", "catalog"),
            audience: text("JWT_AUDIENCE", "catalog-users"),
            ttl_days: parse_or(lookup("JWT_TTL_DAYS"), 7),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            window_secs: parse_or(lookup("RATE_LIMIT_WINDOW_SECS"), defaults.window_secs),
            api_max: parse_or(lookup("RATE_LIMIT_API_MAX"), defaults.api_max),
            auth_max: parse_or(lookup("RATE_LIMIT_AUTH_MAX"), defaults.auth_max),
        };

        let workers = parse_or(
            lookup("WORKERS"),
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
        .max(1);

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            host: text("APP_HOST", "0.0.0.0"),
            port: parse_or(lookup("APP_PORT"), 5000),
            cors_origin: text("CORS_ORIGIN", "http://localhost:3000"),
            workers,
            jwt,
            rate_limit,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}
