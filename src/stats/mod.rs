mod dto;
pub mod engine;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::stats_routes()
}
