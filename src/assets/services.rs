use tracing::info;

use crate::assets::{
    dto::AssetRequest,
    repo_types::{Asset, AssetInput},
};
use crate::error::{ApiError, ApiResult};
use crate::quotes::services::{try_refresh, try_refresh_if_stale};
use crate::state::AppState;

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_uppercase()
}

impl AssetRequest {
    pub fn validate(self) -> ApiResult<AssetInput> {
        let stock_tag = normalize_tag(&self.stock_tag);
        let exchange = normalize_tag(&self.exchange);
        if stock_tag.is_empty() {
            return Err(ApiError::BadRequest("stockTag is required".into()));
        }
        if exchange.is_empty() {
            return Err(ApiError::BadRequest("exchange is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ApiError::BadRequest("price must be a non-negative number".into()));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ApiError::BadRequest("quantity must be a positive number".into()));
        }
        Ok(AssetInput {
            stock_tag,
            exchange,
            price: self.price,
            quantity: self.quantity,
        })
    }
}

/// Record a purchase (`is_purchase`) or sale, then refresh its symbol.
pub async fn record(
    state: &AppState,
    user_id: i64,
    payload: AssetRequest,
    is_purchase: bool,
) -> ApiResult<Asset> {
    let input = payload.validate()?;
    let asset = Asset::insert(&state.db, user_id, &input, is_purchase).await?;
    info!(user_id, asset_id = asset.id, symbol = %asset.stock_tag, is_purchase, "asset recorded");

    reload_after_refresh(state, asset).await
}

pub async fn update(
    state: &AppState,
    user_id: i64,
    id: i64,
    payload: AssetRequest,
) -> ApiResult<Asset> {
    let input = payload.validate()?;
    let asset = Asset::update(&state.db, user_id, id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Asset not found".into()))?;
    info!(user_id, asset_id = id, symbol = %asset.stock_tag, "asset updated");

    reload_after_refresh(state, asset).await
}

pub async fn delete(state: &AppState, user_id: i64, id: i64) -> ApiResult<()> {
    let removed = Asset::delete(&state.db, user_id, id).await?;
    info!(user_id, asset_id = id, removed, "asset delete");
    Ok(())
}

pub async fn list(state: &AppState, user_id: i64) -> ApiResult<Vec<Asset>> {
    try_refresh_if_stale(state, user_id).await;
    Ok(Asset::list_by_user(&state.db, user_id).await?)
}

async fn reload_after_refresh(state: &AppState, asset: Asset) -> ApiResult<Asset> {
    try_refresh(state, asset.user_id, std::slice::from_ref(&asset.stock_tag)).await;
    let fresh = Asset::find(&state.db, asset.user_id, asset.id).await?;
    Ok(fresh.unwrap_or(asset))
}
