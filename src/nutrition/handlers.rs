use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::aggregator::MealNutritionResult;
use super::dto::AnalyzeRequest;
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn nutrition_routes() -> Router<AppState> {
    Router::new().route("/nutrition/analyze", post(analyze))
}

/// Lookup failures never surface here; the result is always a full analysis.
#[instrument(skip(state, body))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AnalyzeRequest>,
) -> Json<MealNutritionResult> {
    Json(state.nutrition.analyze(&body).await)
}
