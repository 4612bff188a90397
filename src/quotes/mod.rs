pub mod client;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::refresh_routes())
}
