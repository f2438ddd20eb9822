use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::models::DietRecord;

#[derive(Debug, FromRow)]
pub struct DietRecordRow {
    pub id: Uuid,
    pub user_id: String,
    pub meal_type: String,
    pub photo_refs: Vec<String>,
    pub tags: Vec<String>,
    pub satisfaction: i16,
    pub description: Option<String>,
    pub location: Option<String>,
    pub calorie_level: Option<String>,
    pub occurred_at: Date,
    pub created_at: OffsetDateTime,
}

impl TryFrom<DietRecordRow> for DietRecord {
    type Error = anyhow::Error;

    fn try_from(r: DietRecordRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            meal_type: r.meal_type.parse()?,
            photo_refs: r.photo_refs,
            tags: r.tags,
            satisfaction: u8::try_from(r.satisfaction)?,
            description: r.description,
            location: r.location,
            calorie_level: r.calorie_level.as_deref().map(str::parse).transpose()?,
            occurred_at: r.occurred_at,
            created_at: r.created_at,
        })
    }
}
