use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::StatsQuery;
use super::engine::StatsSummary;
use super::services::user_summary;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsQuery>,
) -> Result<Json<StatsSummary>, AppError> {
    if let (Some(start), Some(end)) = (q.start, q.end) {
        if start > end {
            return Err(AppError::BadRequest("start must not be after end".into()));
        }
    }
    Ok(Json(user_summary(&state, &user_id, &q).await?))
}
