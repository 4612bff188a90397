use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::AuthUser,
    error::ApiResult,
    quotes::{
        dto::{RefreshRequest, RefreshResponse},
        services::{refresh_batch, try_refresh},
    },
    state::AppState,
};

pub fn refresh_routes() -> Router<AppState> {
    Router::new().route("/refresh-assets", post(refresh_assets))
}

/// Upstream failures are logged, not reported: the answer is always "success".
#[instrument(skip(state, payload))]
pub async fn refresh_assets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(payload) = payload?;
    let limit = state.config.quotes.batch_limit;
    let (symbols, dropped) = refresh_batch(&payload.symbols, limit);
    if dropped > 0 {
        warn!(user_id, dropped, limit, "refresh request truncated");
    }

    try_refresh(&state, user_id, &symbols).await;
    Ok(Json(RefreshResponse { status: "success" }))
}
