use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::models::{iso_date, CalorieLevel, DietRecord, MealType};

/// Record fields shared by the JSON and multipart create routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub meal_type: MealType,
    #[serde(default)]
    pub tags: Vec<String>,
    pub satisfaction: u8,
    pub description: Option<String>,
    pub location: Option<String>,
    pub calorie_level: Option<CalorieLevel>,
    #[serde(default, with = "iso_date::option")]
    pub occurred_at: Option<Date>,
}

/// JSON create body; photos travel as byte arrays.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[serde(flatten)]
    pub draft: RecordDraft,
    #[serde(default)]
    pub photos: Vec<serde_bytes::ByteBuf>,
    #[serde(default)]
    pub content_types: Vec<String>, // parallel to photos
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecordResponse {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub photo_refs: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    #[serde(flatten)]
    pub record: DietRecord,
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    #[serde(default, with = "iso_date::option")]
    pub start: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end: Option<Date>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 20 }

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub dates: Vec<String>,
}
