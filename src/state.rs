use crate::config::AppConfig;
use crate::db;
use crate::quotes::client::{QuoteClient, TwelveDataClient};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub quotes: Arc<dyn QuoteClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url).await?;

        let quotes = Arc::new(TwelveDataClient::new(
            &config.quotes.base_url,
            config.quotes.timeout(),
            config.quotes.max_body_bytes,
        )?) as Arc<dyn QuoteClient>;

        Ok(Self::from_parts(db, config, quotes))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, quotes: Arc<dyn QuoteClient>) -> Self {
        Self { db, config, quotes }
    }

    /// In-memory database plus the given quote client, for tests.
    #[cfg(test)]
    pub async fn fake(quotes: Arc<dyn QuoteClient>) -> Self {
        use crate::config::{JwtConfig, QuotesConfig};

        let db = db::memory().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 30,
            },
            quotes: QuotesConfig::default(),
            cors_origin: None,
        });
        Self::from_parts(db, config, quotes)
    }
}
