use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    assets::{dto::AssetRequest, repo_types::Asset, services},
    auth::AuthUser,
    error::ApiResult,
    state::AppState,
};

pub fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/assets", get(list_assets))
        .route("/assets/add", post(add_asset))
        .route("/assets/sell", post(sell_asset))
        .route("/assets/update/:id", put(update_asset))
        .route("/assets/delete/:id", delete(delete_asset))
}

#[instrument(skip(state))]
pub async fn list_assets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Asset>>> {
    Ok(Json(services::list(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<AssetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let Json(payload) = payload?;
    let asset = services::record(&state, user_id, payload, true).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[instrument(skip(state, payload))]
pub async fn sell_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<AssetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let Json(payload) = payload?;
    let asset = services::record(&state, user_id, payload, false).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[instrument(skip(state, payload))]
pub async fn update_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<AssetRequest>, JsonRejection>,
) -> ApiResult<Json<Asset>> {
    let Json(payload) = payload?;
    Ok(Json(services::update(&state, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_asset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<&'static str> {
    services::delete(&state, user_id, id).await?;
    Ok("Deleted")
}
