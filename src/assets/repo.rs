use sqlx::SqlitePool;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::assets::repo_types::{Asset, AssetInput};
use crate::db::timestamp;
use crate::quotes::dto::Quote;

const ASSET_COLUMNS: &str = "id, user_id, stock_tag, exchange, name, price, quantity, \
                             current_price, is_purchase, created_at, updated_at";

impl Asset {
    /// Insert a purchase (`is_purchase = true`) or sale row for the user.
    pub async fn insert(
        db: &SqlitePool,
        user_id: i64,
        input: &AssetInput,
        is_purchase: bool,
    ) -> anyhow::Result<Asset> {
        let now = timestamp(OffsetDateTime::now_utc())?;
        let asset = sqlx::query_as::<_, Asset>(&format!(
            r#"
            INSERT INTO assets (user_id, stock_tag, exchange, price, quantity, is_purchase, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.stock_tag)
        .bind(&input.exchange)
        .bind(input.price)
        .bind(input.quantity)
        .bind(is_purchase)
        .bind(&now)
        .bind(&now)
        .fetch_one(db)
        .await?;
        Ok(asset)
    }

    pub async fn find(db: &SqlitePool, user_id: i64, id: i64) -> anyhow::Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(asset)
    }

    pub async fn list_by_user(db: &SqlitePool, user_id: i64) -> anyhow::Result<Vec<Asset>> {
        let rows = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE user_id = ? ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Rewrite the user-editable fields. `None` when the row is absent or
    /// belongs to someone else.
    pub async fn update(
        db: &SqlitePool,
        user_id: i64,
        id: i64,
        input: &AssetInput,
    ) -> anyhow::Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            r#"
            UPDATE assets
               SET stock_tag = ?, exchange = ?, price = ?, quantity = ?
             WHERE id = ? AND user_id = ?
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(&input.stock_tag)
        .bind(&input.exchange)
        .bind(input.price)
        .bind(input.quantity)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(asset)
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete(db: &SqlitePool, user_id: i64, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM assets WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }

    /// Most recent `updated_at` across the user's rows.
    pub async fn last_updated(db: &SqlitePool, user_id: i64) -> anyhow::Result<Option<OffsetDateTime>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT MAX(updated_at) FROM assets WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        raw.map(|s| OffsetDateTime::parse(&s, &Rfc3339))
            .transpose()
            .map_err(Into::into)
    }

    /// Distinct stock tags of the user, least recently updated first.
    pub async fn stale_symbols(db: &SqlitePool, user_id: i64, limit: usize) -> anyhow::Result<Vec<String>> {
        let symbols = sqlx::query_scalar::<_, String>(
            r#"
            SELECT stock_tag
              FROM assets
             WHERE user_id = ?
             GROUP BY stock_tag
             ORDER BY MIN(updated_at) ASC, stock_tag ASC
             LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(db)
        .await?;
        Ok(symbols)
    }

    /// Write a quote to every row of the user carrying its stock tag.
    pub async fn apply_quote(
        db: &SqlitePool,
        user_id: i64,
        quote: &Quote,
        at: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE assets
               SET name = COALESCE(?, name), current_price = ?, updated_at = ?
             WHERE user_id = ? AND stock_tag = ?
            "#,
        )
        .bind(quote.name.as_deref())
        .bind(quote.price)
        .bind(timestamp(at)?)
        .bind(user_id)
        .bind(&quote.symbol)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }
}
