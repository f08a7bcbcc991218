//! 予測レスポンスとレシピ表示の型定義
//!
//! - RawPredictionResponse: バックエンドから受け取る未検証のレスポンス
//! - RecipeView: 正規化済みの表示用レシピ（常に全項目が埋まる）
//! - NutritionView: 栄養情報の表示用マップ

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 型が合わないフィールドを「欠損」として扱うデシリアライザ
///
/// LLM由来の値は形が揃わないため、1フィールドの型違いで
/// レスポンス全体のパースを失敗させない。
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// `POST /predict_food_class/` の成功レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPredictionResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub predicted_food: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub llm_info: Option<RawLlmInfo>,
}

/// LLMによる補足情報（レシピ・カロリー・栄養）
///
/// インドネシア語のキー（`resep` / `kalori` / `nutrisi`）も受け付ける。
/// 両方ある場合は英語キーの値を優先する。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "LlmInfoFields")]
pub struct RawLlmInfo {
    pub recipe: Option<RawRecipe>,

    pub calories: Option<String>,

    pub nutrition: Option<RawNutrition>,

    /// LLM出力がJSONでなかった場合にバックエンドが付ける生テキスト
    pub raw_llm_response: Option<String>,
}

/// `llm_info` の受信形（キーごとに独立して寛容に読む）
#[derive(Deserialize)]
struct LlmInfoFields {
    #[serde(default, deserialize_with = "lenient")]
    recipe: Option<RawRecipe>,
    #[serde(default, deserialize_with = "lenient")]
    resep: Option<RawRecipe>,

    #[serde(default, deserialize_with = "lenient")]
    calories: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    kalori: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    nutrition: Option<RawNutrition>,
    #[serde(default, deserialize_with = "lenient")]
    nutrisi: Option<RawNutrition>,

    #[serde(default, deserialize_with = "lenient")]
    raw_llm_response: Option<String>,
}

impl From<LlmInfoFields> for RawLlmInfo {
    fn from(fields: LlmInfoFields) -> Self {
        Self {
            recipe: fields.recipe.or(fields.resep),
            calories: fields.calories.or(fields.kalori),
            nutrition: fields.nutrition.or(fields.nutrisi),
            raw_llm_response: fields.raw_llm_response,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecipe {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub ingredients: Option<Vec<String>>,

    #[serde(default, deserialize_with = "lenient")]
    pub steps: Option<Vec<String>>,
}

/// 栄養情報: 文字列 or 栄養素名→値のオブジェクト
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawNutrition {
    Text(String),
    Table(Map<String, Value>),
}

/// 栄養情報の表示用マップ（キーは先頭大文字化済み）
pub type NutritionView = BTreeMap<String, String>;

/// 正規化済みレシピ
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecipeView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_food: Option<String>,

    pub name: String,

    pub ingredients: Vec<String>,

    pub steps: Vec<String>,

    pub calories: String,

    #[serde(default)]
    pub nutrition: Option<NutritionView>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<String>,
}

/// バックエンドの分類クラス一覧
pub const KNOWN_FOODS: &[&str] = &[
    "ayam_goreng",
    "ayam_pop",
    "daging_rendang",
    "dendeng_batokok",
    "gulai_ikan",
    "gulai_tambusu",
    "gulai_tunjang",
    "telur_balado",
    "telur_dadar",
];

/// 分類クラス名を表示名に変換（"ayam_pop" → "Ayam Pop"）
pub fn display_food_name(class_name: &str) -> String {
    class_name
        .split('_')
        .filter(|w| !w.is_empty())
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 先頭1文字だけ大文字化（残りはそのまま）
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
