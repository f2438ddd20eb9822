use serde::Deserialize;
use time::Date;

use crate::models::iso_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Week,
    Month,
}

impl TimeRange {
    pub fn expected_days(self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
        }
    }
}

/// GET /stats?range=week&start=2025-03-01&end=2025-03-07 (both dates inclusive)
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub range: TimeRange,
    #[serde(default, with = "iso_date::option")]
    pub start: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end: Option<Date>,
}
