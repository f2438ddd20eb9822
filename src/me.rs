use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::DietRecord;
use crate::state::AppState;

/// Lifetime counters for the profile page.
#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeSummary {
    pub user_id: String,
    pub total_records: u32,
    pub total_photos: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub join_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_record_date: Option<OffsetDateTime>,
    /// Local days from the first record through today, both counted.
    pub join_days: u32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/me/summary", get(me_summary))
}

pub fn summarize_profile(user_id: &str, records: &[DietRecord], today: Date) -> MeSummary {
    let join_date = records.iter().map(|r| r.created_at).min();
    let last_record_date = records.iter().map(|r| r.created_at).max();
    let join_days = join_date
        .map(|first| ((today - first.date()).whole_days() + 1).max(1) as u32)
        .unwrap_or(0);

    MeSummary {
        user_id: user_id.to_string(),
        total_records: records.len() as u32,
        total_photos: records.iter().map(|r| r.photo_refs.len() as u32).sum(),
        join_date,
        last_record_date,
        join_days,
    }
}

#[instrument(skip(state))]
pub async fn me_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeSummary>, AppError> {
    let offset = state.config.stats.utc_offset;
    let now = OffsetDateTime::now_utc().to_offset(offset);
    let mut records = state
        .records
        .list_in_window(&user_id, OffsetDateTime::UNIX_EPOCH, now + Duration::days(1))
        .await?;
    for r in &mut records {
        r.created_at = r.created_at.to_offset(offset);
    }
    Ok(Json(summarize_profile(&user_id, &records, now.date())))
}
