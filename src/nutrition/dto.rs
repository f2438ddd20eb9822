use serde::Deserialize;

use crate::models::MealType;

/// POST /nutrition/analyze
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub photo_refs: Vec<String>,
}
