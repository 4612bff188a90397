use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::db::timestamp;

/// Third-party quote API key, one per user.
pub struct ApiKey;

impl ApiKey {
    pub async fn find(db: &SqlitePool, user_id: i64) -> anyhow::Result<Option<String>> {
        let key = sqlx::query_scalar::<_, String>("SELECT api_key FROM api_keys WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(key)
    }

    /// Insert the key, or overwrite the one already stored for the user.
    pub async fn upsert(db: &SqlitePool, user_id: i64, api_key: &str) -> anyhow::Result<()> {
        let updated_at = timestamp(OffsetDateTime::now_utc())?;
        sqlx::query(
            r#"
            INSERT INTO api_keys (user_id, api_key, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
               SET api_key = excluded.api_key, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(api_key)
        .bind(updated_at)
        .execute(db)
        .await?;
        Ok(())
    }
}
