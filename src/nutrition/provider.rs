use std::ops::{Add, Mul};

use async_trait::async_trait;
use serde::Serialize;

use super::inference::FALLBACK_FOOD;
use super::lexicon::FoodCategory;

pub const TABLE_CONFIDENCE: u8 = 75;
pub const REMOTE_CONFIDENCE: u8 = 85;

/// The five tracked nutrient quantities (kcal and grams).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrients {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub fiber_g: f64,
}

impl Nutrients {
    pub const fn new(calories: f64, protein_g: f64, fat_g: f64, carbs_g: f64, fiber_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            fat_g,
            carbs_g,
            fiber_g,
        }
    }

    /// Calories to the nearest integer, grams to one decimal.
    pub fn rounded(&self) -> Self {
        Self {
            calories: self.calories.round(),
            protein_g: round1(self.protein_g),
            fat_g: round1(self.fat_g),
            carbs_g: round1(self.carbs_g),
            fiber_g: round1(self.fiber_g),
        }
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, o: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + o.calories,
            protein_g: self.protein_g + o.protein_g,
            fat_g: self.fat_g + o.fat_g,
            carbs_g: self.carbs_g + o.carbs_g,
            fiber_g: self.fiber_g + o.fiber_g,
        }
    }
}

impl Mul<f64> for Nutrients {
    type Output = Nutrients;

    fn mul(self, k: f64) -> Nutrients {
        Nutrients {
            calories: self.calories * k,
            protein_g: self.protein_g * k,
            fat_g: self.fat_g * k,
            carbs_g: self.carbs_g * k,
            fiber_g: self.fiber_g * k,
        }
    }
}

/// A provider's answer for one food, per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientFacts {
    pub label: String,
    pub per_100g: Nutrients,
    pub category: Option<FoodCategory>,
    pub confidence: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no nutrient data for {0}")]
    NotFound(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[async_trait]
pub trait NutrientProvider: Send + Sync {
    /// Shown to callers as the result's `dataSource`.
    fn label(&self) -> &'static str;

    async fn lookup(&self, food: &str) -> Result<NutrientFacts, ProviderError>;

    /// Food labels detected in the given photos. Most providers see no pixels.
    async fn recognize(&self, _photo_refs: &[String]) -> Vec<String> {
        Vec::new()
    }
}

static LOCAL_TABLE: &[(&str, Nutrients)] = &[
    ("rice", Nutrients::new(130.0, 2.7, 0.3, 28.2, 0.4)),
    ("bread", Nutrients::new(265.0, 9.0, 3.2, 49.0, 2.7)),
    ("egg", Nutrients::new(155.0, 13.0, 11.0, 1.1, 0.0)),
    ("chicken", Nutrients::new(165.0, 31.0, 3.6, 0.0, 0.0)),
    ("vegetables", Nutrients::new(25.0, 2.0, 0.2, 5.0, 2.0)),
    ("fruit", Nutrients::new(60.0, 0.5, 0.2, 15.0, 2.0)),
    ("milk", Nutrients::new(42.0, 3.4, 1.0, 5.0, 0.0)),
    ("broccoli", Nutrients::new(34.0, 2.8, 0.4, 7.0, 2.6)),
    ("apple", Nutrients::new(52.0, 0.3, 0.2, 14.0, 2.4)),
    ("salad", Nutrients::new(20.0, 1.5, 0.2, 3.8, 2.0)),
    (FALLBACK_FOOD, Nutrients::new(350.0, 15.0, 10.0, 45.0, 3.0)),
];

/// Offline table; unknown foods are answered with the "mixed meal" entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTable;

impl LocalTable {
    pub fn known_foods() -> impl Iterator<Item = &'static str> {
        LOCAL_TABLE
            .iter()
            .map(|(n, _)| *n)
            .filter(|n| *n != FALLBACK_FOOD)
    }

    pub fn facts(food: &str) -> NutrientFacts {
        let key = food.to_lowercase();
        let per_100g = LOCAL_TABLE
            .iter()
            .find(|(n, _)| *n == key)
            .or_else(|| LOCAL_TABLE.iter().find(|(n, _)| *n == FALLBACK_FOOD))
            .map(|(_, v)| *v)
            .unwrap_or_default();
        NutrientFacts {
            label: food.to_string(),
            per_100g,
            category: None,
            confidence: TABLE_CONFIDENCE,
        }
    }

    pub fn fallback() -> NutrientFacts {
        Self::facts(FALLBACK_FOOD)
    }
}

#[async_trait]
impl NutrientProvider for LocalTable {
    fn label(&self) -> &'static str {
        "Local table"
    }

    async fn lookup(&self, food: &str) -> Result<NutrientFacts, ProviderError> {
        Ok(Self::facts(food))
    }
}
