use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    api_keys::{
        dto::{ApiKeyRequest, ApiKeyResponse},
        repo::ApiKey,
    },
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn api_key_routes() -> Router<AppState> {
    Router::new().route("/api-key", get(get_api_key).post(save_api_key))
}

#[instrument(skip(state))]
pub async fn get_api_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<ApiKeyResponse>> {
    let api_key = ApiKey::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("API key not found".into()))?;
    Ok(Json(ApiKeyResponse { api_key }))
}

#[instrument(skip(state, payload))]
pub async fn save_api_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ApiKeyRequest>, JsonRejection>,
) -> ApiResult<Json<ApiKeyResponse>> {
    let Json(payload) = payload?;
    let api_key = payload.api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(ApiError::BadRequest("api_key is required".into()));
    }

    ApiKey::upsert(&state.db, user_id, &api_key).await?;
    info!(user_id, "api key saved");
    Ok(Json(ApiKeyResponse { api_key }))
}
