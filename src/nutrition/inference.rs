use std::collections::HashSet;

use serde::Serialize;

use super::lexicon::{self, LEXICON};
use crate::models::MealType;

pub const FALLBACK_FOOD: &str = "mixed meal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateSource {
    Tag,
    Description,
    MealTypeDefault,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCandidate {
    pub canonical_name: String,
    pub source: CandidateSource,
}

fn meal_type_defaults(meal_type: MealType) -> &'static [&'static str] {
    match meal_type {
        MealType::Breakfast => &["bread", "egg", "milk"],
        MealType::Lunch | MealType::Dinner => &["rice", "chicken", "vegetables"],
        MealType::Snack => &["fruit", "yogurt"],
    }
}

struct Candidates {
    seen: HashSet<String>,
    out: Vec<FoodCandidate>,
}

impl Candidates {
    fn push(&mut self, name: &str, source: CandidateSource) {
        if self.seen.insert(name.to_lowercase()) {
            self.out.push(FoodCandidate {
                canonical_name: name.to_string(),
                source,
            });
        }
    }
}

/// Turns free-form meal signals into an ordered, duplicate-free list of food
/// terms. Explicit signals come first; the result is never empty.
pub fn infer(
    tags: &[String],
    description: Option<&str>,
    meal_type: Option<MealType>,
) -> Vec<FoodCandidate> {
    let mut c = Candidates {
        seen: HashSet::new(),
        out: Vec::new(),
    };

    for tag in tags {
        let tag = tag.trim();
        if let Some(t) = lexicon::by_local(tag) {
            c.push(t.canonical_name, CandidateSource::Tag);
        } else if tag.chars().count() > 1 {
            c.push(tag, CandidateSource::Tag);
        }
    }

    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        for t in LEXICON.iter().filter(|t| desc.contains(t.local_name)) {
            c.push(t.canonical_name, CandidateSource::Description);
        }
    }

    if c.out.is_empty() {
        if let Some(m) = meal_type {
            for name in meal_type_defaults(m) {
                c.push(name, CandidateSource::MealTypeDefault);
            }
        }
    }

    if c.out.is_empty() {
        c.push(FALLBACK_FOOD, CandidateSource::Fallback);
    }

    c.out
}
