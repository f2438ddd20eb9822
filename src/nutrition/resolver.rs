use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::inference::FoodCandidate;
use super::lexicon::{self, FoodCategory};
use super::provider::{LocalTable, NutrientFacts, NutrientProvider, Nutrients, ProviderError, TABLE_CONFIDENCE};

pub const DEFAULT_PORTION_GRAMS: f64 = 100.0;

// First substring match wins.
static PORTIONS: &[(&str, f64)] = &[
    ("rice", 150.0),
    ("noodles", 200.0),
    ("bread", 50.0),
    ("egg", 50.0),
    ("chicken", 100.0),
    ("beef", 100.0),
    ("pork", 100.0),
    ("fish", 120.0),
    ("vegetables", 150.0),
    ("fruit", 150.0),
    ("milk", 250.0),
    ("yogurt", 150.0),
];

static CATEGORY_KEYWORDS: &[(FoodCategory, &[&str])] = &[
    (FoodCategory::Grain, &["rice", "bread", "pasta", "noodle", "cereal", "wheat", "oat"]),
    (FoodCategory::Protein, &["chicken", "beef", "pork", "fish", "egg", "bean", "tofu", "meat"]),
    (FoodCategory::Vegetable, &["vegetable", "salad", "broccoli", "carrot", "tomato", "lettuce", "cucumber"]),
    (FoodCategory::Fruit, &["apple", "banana", "orange", "berry", "fruit", "grape"]),
    (FoodCategory::Dairy, &["milk", "cheese", "yogurt", "dairy"]),
];

pub fn estimate_portion(food: &str) -> f64 {
    let lower = food.to_lowercase();
    PORTIONS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, grams)| *grams)
        .or_else(|| lexicon::by_canonical(&lower).map(|t| t.default_portion_grams))
        .unwrap_or(DEFAULT_PORTION_GRAMS)
}

pub fn categorize(food: &str) -> FoodCategory {
    if let Some(t) = lexicon::by_canonical(food) {
        return t.category;
    }
    let lower = food.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(c, _)| *c)
        .unwrap_or(FoodCategory::Other)
}

/// Nutrients of one food scaled to its estimated portion. Values are kept
/// unrounded so meal totals can be rounded once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientProfile {
    pub name: String,
    pub portion_grams: f64,
    pub unit: &'static str,
    pub confidence_percent: u8,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    pub category: FoodCategory,
}

impl NutrientProfile {
    fn from_facts(food: &str, facts: NutrientFacts) -> Self {
        let portion = estimate_portion(food);
        let name = if lexicon::by_canonical(food).is_some() {
            lexicon::display_name(food)
        } else {
            lexicon::display_name(&facts.label)
        };
        Self {
            name,
            portion_grams: portion,
            unit: "g",
            confidence_percent: facts.confidence.min(100),
            nutrients: facts.per_100g * (portion / 100.0),
            category: facts.category.unwrap_or_else(|| categorize(food)),
        }
    }

    /// Fallback used whenever a lookup fails.
    pub fn estimated(food: &str) -> Self {
        let mut profile = Self::from_facts(food, LocalTable::fallback());
        profile.name = lexicon::display_name(food);
        profile.confidence_percent = TABLE_CONFIDENCE;
        profile
    }

    /// Copy for display: kcal to integers, grams to one decimal.
    pub fn rounded(&self) -> Self {
        Self {
            nutrients: self.nutrients.rounded(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub profile: NutrientProfile,
    /// False when the profile is the estimated fallback.
    pub from_provider: bool,
}

#[derive(Clone)]
pub struct Resolver {
    provider: Arc<dyn NutrientProvider>,
    timeout: Duration,
    max_candidates: usize,
}

impl Resolver {
    pub fn new(provider: Arc<dyn NutrientProvider>, timeout: Duration, max_candidates: usize) -> Self {
        Self {
            provider,
            timeout,
            max_candidates,
        }
    }

    pub fn provider(&self) -> &Arc<dyn NutrientProvider> {
        &self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Never fails: misses, transport errors and timeouts become the
    /// estimated fallback profile.
    pub async fn resolve(&self, candidate: &FoodCandidate) -> Resolution {
        let food = candidate.canonical_name.as_str();
        let outcome = match tokio::time::timeout(self.timeout, self.provider.lookup(food)).await {
            Ok(r) => r,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };
        match outcome {
            Ok(facts) => {
                debug!(food, confidence = facts.confidence, "nutrients resolved");
                Resolution {
                    profile: NutrientProfile::from_facts(food, facts),
                    from_provider: true,
                }
            }
            Err(e) => {
                warn!(food, error = %e, provider = self.provider.label(), "nutrient lookup failed; using estimate");
                Resolution {
                    profile: NutrientProfile::estimated(food),
                    from_provider: false,
                }
            }
        }
    }

    /// Resolves the leading candidates concurrently; the rest are dropped.
    /// Results keep candidate order.
    pub async fn resolve_all(&self, candidates: &[FoodCandidate]) -> Vec<Resolution> {
        let picked = &candidates[..candidates.len().min(self.max_candidates)];
        let handles: Vec<_> = picked
            .iter()
            .cloned()
            .map(|c| {
                let resolver = self.clone();
                tokio::spawn(async move { resolver.resolve(&c).await })
            })
            .collect();

        let mut out = Vec::with_capacity(handles.len());
        for (candidate, handle) in picked.iter().zip(handles) {
            match handle.await {
                Ok(r) => out.push(r),
                Err(e) => {
                    error!(error = %e, food = %candidate.canonical_name, "nutrient lookup task failed");
                    out.push(Resolution {
                        profile: NutrientProfile::estimated(&candidate.canonical_name),
                        from_provider: false,
                    });
                }
            }
        }
        out
    }
}
