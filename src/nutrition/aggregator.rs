use serde::Serialize;
use time::OffsetDateTime;

use super::lexicon::FoodCategory;
use super::provider::Nutrients;
use super::resolver::NutrientProfile;

pub const HIGH_CALORIES: f64 = 800.0;
pub const LOW_CALORIES: f64 = 300.0;
pub const MIN_PROTEIN_G: f64 = 10.0;
pub const MIN_FIBER_G: f64 = 3.0;
pub const MAX_CARB_SHARE: f64 = 0.65;
pub const MAX_FAT_SHARE: f64 = 0.4;

// Messages are shown next to the lexicon's local food names.
pub const MSG_HIGH_CALORIES: &str = "这一餐的热量较高，建议适当控制份量";
pub const MSG_LOW_CALORIES: &str = "这一餐的热量较低，如果是正餐可以适当增加";
pub const MSG_LOW_PROTEIN: &str = "蛋白质含量较低，建议添加鸡蛋、豆类或肉类";
pub const MSG_LOW_FIBER: &str = "膳食纤维不足，建议增加蔬菜或水果";
pub const MSG_NO_VEGETABLES: &str = "缺少蔬菜，建议每餐都要有蔬菜";
pub const MSG_HIGH_CARB_SHARE: &str = "碳水化合物比例较高，可以增加蛋白质摄入";
pub const MSG_HIGH_FAT_SHARE: &str = "脂肪含量较高，注意选择健康脂肪来源";
pub const MSG_BALANCED: &str = "营养搭配合理，继续保持！";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub severity: Severity,
    pub message: &'static str,
}

impl Suggestion {
    const fn new(severity: Severity, message: &'static str) -> Self {
        Self { severity, message }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealNutritionResult {
    pub foods: Vec<NutrientProfile>,
    pub total_nutrition: Nutrients,
    pub suggestions: Vec<Suggestion>,
    #[serde(with = "time::serde::rfc3339")]
    pub analysis_timestamp: OffsetDateTime,
    pub data_source: String,
}

/// Sums unrounded per-food values and rounds the total once.
pub fn total(profiles: &[NutrientProfile]) -> Nutrients {
    profiles
        .iter()
        .fold(Nutrients::default(), |acc, p| acc + p.nutrients)
        .rounded()
}

/// Every rule is checked; a meal with several problems gets several
/// suggestions.
pub fn suggestions(total: &Nutrients, profiles: &[NutrientProfile]) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if total.calories > HIGH_CALORIES {
        out.push(Suggestion::new(
            Severity::Warning,
            MSG_HIGH_CALORIES,
        ));
    }
    if total.calories < LOW_CALORIES && !profiles.is_empty() {
        out.push(Suggestion::new(
            Severity::Info,
            MSG_LOW_CALORIES,
        ));
    }
    if total.protein_g < MIN_PROTEIN_G {
        out.push(Suggestion::new(
            Severity::Info,
            MSG_LOW_PROTEIN,
        ));
    }
    if total.fiber_g < MIN_FIBER_G {
        out.push(Suggestion::new(
            Severity::Info,
            MSG_LOW_FIBER,
        ));
    }
    if !profiles.iter().any(|p| p.category == FoodCategory::Vegetable) {
        out.push(Suggestion::new(
            Severity::Warning,
            MSG_NO_VEGETABLES,
        ));
    }

    let macros = total.protein_g + total.fat_g + total.carbs_g;
    if macros > 0.0 {
        if total.carbs_g / macros > MAX_CARB_SHARE {
            out.push(Suggestion::new(
                Severity::Info,
                MSG_HIGH_CARB_SHARE,
            ));
        }
        if total.fat_g / macros > MAX_FAT_SHARE {
            out.push(Suggestion::new(
                Severity::Warning,
                MSG_HIGH_FAT_SHARE,
            ));
        }
    }

    if out.is_empty() {
        out.push(Suggestion::new(
            Severity::Success,
            MSG_BALANCED,
        ));
    }
    out
}

pub fn aggregate(profiles: Vec<NutrientProfile>, data_source: impl Into<String>) -> MealNutritionResult {
    let total_nutrition = total(&profiles);
    let suggestions = suggestions(&total_nutrition, &profiles);
    MealNutritionResult {
        foods: profiles.iter().map(NutrientProfile::rounded).collect(),
        total_nutrition,
        suggestions,
        analysis_timestamp: OffsetDateTime::now_utc(),
        data_source: data_source.into(),
    }
}
