//! Food Recipe Common Library
//!
//! 予測レスポンスの型と正規化ロジック（I/Oなし）

pub mod types;
pub mod error;
pub mod normalizer;

pub use types::{
    display_food_name, NutritionView, RawLlmInfo, RawNutrition, RawPredictionResponse, RawRecipe,
    RecipeView, KNOWN_FOODS,
};
pub use error::NormalizeError;
pub use normalizer::{format_nutrition, normalize, normalize_value, Normalized, INSUFFICIENT_MESSAGE};
