use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the third-party quote API and the refresh policy.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub stale_after_secs: i64,
    pub batch_limit: usize,
    pub max_body_bytes: usize,
}

impl QuotesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvedata.com".into(),
            timeout_secs: 10,
            stale_after_secs: 60,
            batch_limit: 8,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub quotes: QuotesConfig,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").unwrap_or_else(|| "sqlite://data/database.db".into());
        let jwt = JwtConfig {
            secret: var("AUTH_SECRET_KEY").context("AUTH_SECRET_KEY is not set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "myinvestmap".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "myinvestmap-users".into()),
            ttl_minutes: var("JWT_TTL_MINUTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(30),
        };
        if jwt.secret.trim().is_empty() {
            anyhow::bail!("AUTH_SECRET_KEY must not be empty");
        }

        let defaults = QuotesConfig::default();
        let quotes = QuotesConfig {
            base_url: var("QUOTES_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: var("QUOTES_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
            stale_after_secs: var("QUOTES_STALE_AFTER_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.stale_after_secs),
            batch_limit: var("QUOTES_BATCH_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.batch_limit),
            max_body_bytes: var("QUOTES_MAX_BODY_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        };
        if quotes.timeout_secs == 0 {
            anyhow::bail!("QUOTES_TIMEOUT_SECS must be at least 1");
        }
        if quotes.batch_limit == 0 || quotes.max_body_bytes == 0 {
            anyhow::bail!("QUOTES_BATCH_LIMIT and QUOTES_MAX_BODY_BYTES must be positive");
        }

        let cors_origin = var("CORS_ORIGIN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            jwt,
            quotes,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("AUTH_SECRET_KEY", "s3cret")]).unwrap();
        assert_eq!(config.database_url, "sqlite://data/database.db");
        assert_eq!(config.jwt.ttl_minutes, 30);
        assert_eq!(config.quotes.base_url, "https://api.twelvedata.com");
        assert_eq!(config.quotes.timeout(), Duration::from_secs(10));
        assert_eq!(config.quotes.stale_after_secs, 60);
        assert_eq!(config.quotes.batch_limit, 8);
        assert_eq!(config.quotes.max_body_bytes, 1024 * 1024);
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("AUTH_SECRET_KEY", "s3cret"),
            ("JWT_TTL_MINUTES", "5"),
            ("QUOTES_BATCH_LIMIT", " 3 "),
            ("QUOTES_TIMEOUT_SECS", "not-a-number"),
            ("CORS_ORIGIN", "http://localhost:3000"),
        ])
        .unwrap();
        assert_eq!(config.jwt.ttl_minutes, 5);
        assert_eq!(config.quotes.batch_limit, 3);
        assert_eq!(config.quotes.timeout_secs, 10);
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = load(&[("AUTH_SECRET_KEY", "s"), ("QUOTES_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("QUOTES_TIMEOUT_SECS"));
        assert!(load(&[("AUTH_SECRET_KEY", "s"), ("QUOTES_BATCH_LIMIT", "0")]).is_err());
        assert!(load(&[("AUTH_SECRET_KEY", "s"), ("QUOTES_MAX_BODY_BYTES", "0")]).is_err());
    }

    #[test]
    fn secret_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("AUTH_SECRET_KEY", "  ")]).is_err());
    }
}
