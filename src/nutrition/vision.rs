use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, warn};

use super::provider::{LocalTable, NutrientFacts, NutrientProvider, ProviderError};

/// Labels below this probability are ignored.
pub const MIN_RECOGNITION_PROBABILITY: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedFood {
    pub name: String,
    pub probability: f32,
}

#[async_trait]
pub trait FoodRecognizer: Send + Sync {
    async fn recognize(&self, photo_ref: &str) -> anyhow::Result<Vec<RecognizedFood>>;
}

/// Demo recognizer for deployments without a vision backend.
///
/// Output depends only on the seed and the photo reference, so repeated
/// analyses of the same photo agree with each other.
#[derive(Debug, Clone, Copy)]
pub struct SeededRecognizer {
    seed: u64,
}

impl SeededRecognizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, photo_ref: &str) -> StdRng {
        let mixed = photo_ref
            .bytes()
            .fold(self.seed ^ 0xcbf2_9ce4_8422_2325, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        StdRng::seed_from_u64(mixed)
    }
}

#[async_trait]
impl FoodRecognizer for SeededRecognizer {
    async fn recognize(&self, photo_ref: &str) -> anyhow::Result<Vec<RecognizedFood>> {
        let mut rng = self.rng_for(photo_ref);
        let foods: Vec<&str> = LocalTable::known_foods().collect();
        let count = rng.gen_range(2..=4);
        let picked: Vec<&str> = foods.choose_multiple(&mut rng, count).copied().collect();
        Ok(picked
            .into_iter()
            .map(|name| RecognizedFood {
                name: name.to_string(),
                probability: rng.gen_range(0.6..1.0),
            })
            .collect())
    }
}

/// Provider that can see photos: labels come from a recognizer, nutrient
/// numbers from the wrapped provider.
pub struct RecognitionBacked {
    recognizer: Arc<dyn FoodRecognizer>,
    inner: Arc<dyn NutrientProvider>,
}

impl RecognitionBacked {
    pub fn new(recognizer: Arc<dyn FoodRecognizer>, inner: Arc<dyn NutrientProvider>) -> Self {
        Self { recognizer, inner }
    }
}

#[async_trait]
impl NutrientProvider for RecognitionBacked {
    fn label(&self) -> &'static str {
        "AI recognition"
    }

    async fn lookup(&self, food: &str) -> Result<NutrientFacts, ProviderError> {
        self.inner.lookup(food).await
    }

    async fn recognize(&self, photo_refs: &[String]) -> Vec<String> {
        let mut labels = Vec::new();
        for photo in photo_refs {
            match self.recognizer.recognize(photo).await {
                Ok(found) => labels.extend(
                    found
                        .into_iter()
                        .filter(|f| f.probability > MIN_RECOGNITION_PROBABILITY)
                        .map(|f| f.name),
                ),
                Err(e) => warn!(error = %e, photo = %photo, "food recognition failed"),
            }
        }
        debug!(count = labels.len(), "recognized food labels");
        labels
    }
}
