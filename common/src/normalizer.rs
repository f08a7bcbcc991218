//! レシピ正規化モジュール
//!
//! 未検証の予測レスポンスを、常に表示可能な RecipeView に変換する。
//!
//! ## フォールバック方針
//! 1. ペイロード自体が無い → NoData（部分ビューは作らない）
//! 2. 料理名・材料・手順・カロリーはそれぞれ独立に既定文言へ置換
//! 3. 1項目でも置換したら「情報不足」フラグを立てる（ビューは返す）

use crate::error::NormalizeError;
use crate::types::{
    capitalize_first, NutritionView, RawNutrition, RawPredictionResponse, RawRecipe, RecipeView,
};
use serde_json::Value;

pub const NAME_FALLBACK: &str = "Recipe name not available.";
pub const INGREDIENTS_FALLBACK: &str = "Ingredients not available.";
pub const STEPS_FALLBACK: &str = "Steps not available.";
pub const CALORIES_FALLBACK: &str = "Calories information not available.";
pub const INSUFFICIENT_MESSAGE: &str = "LLM did not return sufficient recipe information.";

/// 栄養情報がテキストだった場合のキー
pub const GENERAL_NUTRITION_KEY: &str = "General";

/// 正規化結果
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub view: RecipeView,
    /// いずれかの必須項目が既定文言に置換された
    pub insufficient: bool,
}

impl Normalized {
    /// 情報不足時にユーザーへ表示する警告
    pub fn warning(&self) -> Option<&'static str> {
        self.insufficient.then_some(INSUFFICIENT_MESSAGE)
    }
}

/// 予測レスポンスを正規化する
///
/// # Arguments
/// * `raw` - バックエンドのレスポンス（`null` やパース不能なら `None`）
///
/// # Returns
/// * `Ok(Normalized)` - 表示可能なビューと情報不足フラグ
/// * `Err(NormalizeError::NoData)` - ペイロードが無い
pub fn normalize(raw: Option<&RawPredictionResponse>) -> Result<Normalized, NormalizeError> {
    let raw = raw.ok_or(NormalizeError::NoData)?;

    let empty_recipe = RawRecipe::default();
    let info = raw.llm_info.as_ref();
    let recipe = info.and_then(|i| i.recipe.as_ref()).unwrap_or(&empty_recipe);

    let mut defaulted = false;

    let name = match recipe.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            defaulted = true;
            NAME_FALLBACK.to_string()
        }
    };

    let ingredients = non_empty_list(recipe.ingredients.as_ref(), INGREDIENTS_FALLBACK, &mut defaulted);
    let steps = non_empty_list(recipe.steps.as_ref(), STEPS_FALLBACK, &mut defaulted);

    let calories = match info.and_then(|i| i.calories.as_deref()) {
        Some(calories) => calories.to_string(),
        None => {
            defaulted = true;
            CALORIES_FALLBACK.to_string()
        }
    };

    let nutrition = info
        .and_then(|i| i.nutrition.as_ref())
        .and_then(format_nutrition);

    Ok(Normalized {
        view: RecipeView {
            predicted_food: raw.predicted_food.clone(),
            name,
            ingredients,
            steps,
            calories,
            nutrition,
            raw_llm_response: info.and_then(|i| i.raw_llm_response.clone()),
        },
        insufficient: defaulted,
    })
}

/// JSON値から正規化する（オブジェクト以外は NoData）
pub fn normalize_value(value: &Value) -> Result<Normalized, NormalizeError> {
    let raw: Option<RawPredictionResponse> = value
        .as_object()
        .and_then(|_| serde_json::from_value(value.clone()).ok());
    normalize(raw.as_ref())
}

fn non_empty_list(list: Option<&Vec<String>>, fallback: &str, defaulted: &mut bool) -> Vec<String> {
    match list {
        Some(items) if !items.is_empty() => items.clone(),
        _ => {
            *defaulted = true;
            vec![fallback.to_string()]
        }
    }
}

/// 栄養情報を表示用に整形する
///
/// - テキスト → `{General: テキスト}`
/// - オブジェクト → キーの先頭を大文字化、値はそのまま
/// - 空文字・空オブジェクト → `None`
pub fn format_nutrition(nutrition: &RawNutrition) -> Option<NutritionView> {
    match nutrition {
        RawNutrition::Text(text) if text.is_empty() => None,
        RawNutrition::Text(text) => {
            Some(NutritionView::from([(GENERAL_NUTRITION_KEY.to_string(), text.clone())]))
        }
        RawNutrition::Table(table) if table.is_empty() => None,
        RawNutrition::Table(table) => Some(
            table
                .iter()
                .map(|(key, value)| (capitalize_first(key), display_value(value)))
                .collect(),
        ),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
