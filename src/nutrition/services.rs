use std::sync::Arc;

use tracing::{info, warn};

use super::aggregator::{aggregate, MealNutritionResult};
use super::dto::AnalyzeRequest;
use super::edamam::EdamamLookup;
use super::inference::infer;
use super::provider::{LocalTable, NutrientProvider};
use super::resolver::Resolver;
use super::vision::{RecognitionBacked, SeededRecognizer};
use crate::config::{NutritionConfig, ProviderKind};

pub const ESTIMATED_SOURCE: &str = "Estimated";

/// Per-meal path: signals → candidates → nutrients → totals and advice.
#[derive(Clone)]
pub struct NutritionAnalyzer {
    resolver: Resolver,
}

impl NutritionAnalyzer {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(cfg: &NutritionConfig) -> anyhow::Result<Self> {
        let provider: Arc<dyn NutrientProvider> = match cfg.provider {
            ProviderKind::Local => Arc::new(LocalTable),
            ProviderKind::Edamam => match &cfg.edamam {
                Some(edamam) => Arc::new(EdamamLookup::new(edamam.clone(), cfg.lookup_timeout)?),
                None => {
                    warn!("edamam selected without credentials; using local table");
                    Arc::new(LocalTable)
                }
            },
            ProviderKind::Vision => Arc::new(RecognitionBacked::new(
                Arc::new(SeededRecognizer::new(cfg.vision_seed)),
                Arc::new(LocalTable),
            )),
        };
        info!(provider = provider.label(), "nutrition provider ready");
        Ok(Self::new(Resolver::new(provider, cfg.lookup_timeout, cfg.max_candidates)))
    }

    pub async fn analyze(&self, req: &AnalyzeRequest) -> MealNutritionResult {
        let provider = self.resolver.provider();

        let timeout = self.resolver.timeout();
        let mut tags = match tokio::time::timeout(timeout, provider.recognize(&req.photo_refs)).await {
            Ok(labels) => labels,
            Err(_) => {
                warn!(?timeout, photos = req.photo_refs.len(), "food recognition timed out; using tags only");
                Vec::new()
            }
        };
        tags.extend(req.tags.iter().cloned());

        let candidates = infer(&tags, req.description.as_deref(), req.meal_type);
        let resolved = self.resolver.resolve_all(&candidates).await;

        let data_source = if resolved.iter().any(|r| r.from_provider) {
            provider.label()
        } else {
            ESTIMATED_SOURCE
        };
        info!(
            candidates = candidates.len(),
            resolved = resolved.len(),
            data_source,
            "meal analyzed"
        );
        aggregate(resolved.into_iter().map(|r| r.profile).collect(), data_source)
    }
}
