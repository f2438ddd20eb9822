use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::provider::{NutrientFacts, NutrientProvider, Nutrients, ProviderError, REMOTE_CONFIDENCE};
use crate::config::EdamamConfig;

#[derive(Debug, Deserialize)]
struct ParserResponse {
    #[serde(default)]
    hints: Vec<Hint>,
}

#[derive(Debug, Deserialize)]
struct Hint {
    food: EdamamFood,
}

#[derive(Debug, Deserialize)]
struct EdamamFood {
    label: Option<String>,
    #[serde(default)]
    nutrients: EdamamNutrients,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct EdamamNutrients {
    enerc_kcal: Option<f64>,
    procnt: Option<f64>,
    fat: Option<f64>,
    chocdf: Option<f64>,
    fibtg: Option<f64>,
}

impl From<EdamamNutrients> for Nutrients {
    fn from(n: EdamamNutrients) -> Self {
        Nutrients::new(
            n.enerc_kcal.unwrap_or(0.0),
            n.procnt.unwrap_or(0.0),
            n.fat.unwrap_or(0.0),
            n.chocdf.unwrap_or(0.0),
            n.fibtg.unwrap_or(0.0),
        )
    }
}

/// Remote lookup against the Edamam food-database parser.
pub struct EdamamLookup {
    client: reqwest::Client,
    config: EdamamConfig,
}

impl EdamamLookup {
    pub fn new(config: EdamamConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

fn first_hint(food: &str, body: ParserResponse) -> Result<NutrientFacts, ProviderError> {
    let hint = body
        .hints
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(food.to_string()))?;
    Ok(NutrientFacts {
        label: hint.food.label.unwrap_or_else(|| food.to_string()),
        per_100g: hint.food.nutrients.into(),
        // Edamam categories ("Generic foods", ...) don't map onto ours
        category: None,
        confidence: REMOTE_CONFIDENCE,
    })
}

#[async_trait]
impl NutrientProvider for EdamamLookup {
    fn label(&self) -> &'static str {
        "Edamam API"
    }

    async fn lookup(&self, food: &str) -> Result<NutrientFacts, ProviderError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
                ("ingr", food),
                ("nutrition-type", "cooking"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP {status}")));
        }

        let body: ParserResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        debug!(food, hints = body.hints.len(), "edamam lookup");
        first_hint(food, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_first_hint() {
        let body: ParserResponse = serde_json::from_str(
            r#"{"text":"rice","hints":[
                {"food":{"label":"Rice","category":"Generic foods",
                 "nutrients":{"ENERC_KCAL":130.0,"PROCNT":2.69,"FAT":0.28,"CHOCDF":28.17}}},
                {"food":{"label":"Rice Cake","nutrients":{}}}
            ]}"#,
        )
        .unwrap();
        let facts = first_hint("rice", body).unwrap();
        assert_eq!(facts.label, "Rice");
        assert_eq!(facts.confidence, REMOTE_CONFIDENCE);
        assert_eq!(facts.per_100g.calories, 130.0);
        assert_eq!(facts.per_100g.fiber_g, 0.0);
    }

    #[test]
    fn empty_hints_is_a_miss() {
        let body: ParserResponse = serde_json::from_str(r#"{"text":"zzz"}"#).unwrap();
        assert!(matches!(first_hint("zzz", body), Err(ProviderError::NotFound(f)) if f == "zzz"));
    }
}
