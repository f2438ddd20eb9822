pub mod aggregator;
mod dto;
pub mod edamam;
pub mod handlers;
pub mod inference;
pub mod lexicon;
pub mod provider;
pub mod resolver;
pub mod services;
pub mod vision;

use crate::state::AppState;
use axum::Router;

pub use services::NutritionAnalyzer;

pub fn router() -> Router<AppState> {
    handlers::nutrition_routes()
}
