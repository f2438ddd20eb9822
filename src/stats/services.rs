use anyhow::Context;
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

use super::dto::StatsQuery;
use super::engine::{summarize, StatsSummary, StatsWindow};
use crate::state::AppState;

/// Resolves the query against the local calendar. Missing bounds default to
/// the `expected_days` days ending today.
pub fn window_for(q: &StatsQuery, offset: UtcOffset, today: Date) -> StatsWindow {
    let expected_days = q.range.expected_days();
    let last = q.end.unwrap_or(today);
    let first = q
        .start
        .unwrap_or_else(|| last - Duration::days(i64::from(expected_days) - 1));
    let midnight = |d: Date| d.with_time(Time::MIDNIGHT).assume_offset(offset);
    StatsWindow {
        start: midnight(first),
        end: midnight(last) + Duration::days(1),
        expected_days,
    }
}

pub async fn user_summary(
    st: &AppState,
    user_id: &str,
    q: &StatsQuery,
) -> anyhow::Result<StatsSummary> {
    let offset = st.config.stats.utc_offset;
    let today = OffsetDateTime::now_utc().to_offset(offset).date();
    let window = window_for(q, offset, today);

    let mut records = st
        .records
        .list_in_window(user_id, window.start, window.end)
        .await
        .context("load records for stats")?;
    for r in &mut records {
        r.created_at = r.created_at.to_offset(offset);
    }
    Ok(summarize(&records, &window))
}
