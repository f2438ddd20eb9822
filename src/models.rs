use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown meal type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalorieLevel {
    Low,
    Medium,
    High,
}

impl CalorieLevel {
    pub const ALL: [CalorieLevel; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for CalorieLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown calorie level: {s}"))
    }
}

/// One logged meal. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietRecord {
    pub id: Uuid,
    pub user_id: String,
    pub meal_type: MealType,
    pub photo_refs: Vec<String>,
    pub tags: Vec<String>,
    pub satisfaction: u8,
    pub description: Option<String>,
    pub location: Option<String>,
    pub calorie_level: Option<CalorieLevel>,
    #[serde(with = "iso_date")]
    pub occurred_at: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for the record store; id and `created_at` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewDietRecord {
    pub user_id: String,
    pub meal_type: MealType,
    pub photo_refs: Vec<String>,
    pub tags: Vec<String>,
    pub satisfaction: u8,
    pub description: Option<String>,
    pub location: Option<String>,
    pub calorie_level: Option<CalorieLevel>,
    pub occurred_at: Date,
}
