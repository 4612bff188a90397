use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// One buy or sell transaction, as stored and as returned to the client.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub stock_tag: String,
    pub exchange: String,
    pub name: Option<String>,           // filled in by the quote refresher
    pub price: f64,                     // price per unit at purchase/sale
    pub quantity: f64,
    pub current_price: Option<f64>,    // filled in by the quote refresher
    pub is_purchase: bool,              // false for sale rows
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated, normalised fields of an add/sell/update request.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInput {
    pub stock_tag: String,
    pub exchange: String,
    pub price: f64,
    pub quantity: f64,
}
