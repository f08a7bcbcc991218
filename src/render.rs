//! 端末向けのレシピ表示

use crate::state::UploadState;
use food_recipe_common::{display_food_name, RecipeView};
use std::fmt::Write;

pub fn render_recipe(recipe: &RecipeView) -> String {
    let mut out = String::new();

    if let Some(food) = &recipe.predicted_food {
        let _ = writeln!(out, "🍽  {} ({})", display_food_name(food), food);
    }
    let _ = writeln!(out, "📖 {}", recipe.name);

    let _ = writeln!(out, "\n材料:");
    for item in &recipe.ingredients {
        let _ = writeln!(out, "  - {}", item);
    }

    let _ = writeln!(out, "\n手順:");
    for (i, step) in recipe.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }

    let _ = writeln!(out, "\nカロリー: {}", recipe.calories);

    if let Some(nutrition) = &recipe.nutrition {
        let _ = writeln!(out, "\n栄養:");
        for (key, value) in nutrition {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }

    out
}

/// 状態全体（レシピ・警告/エラー・完了時刻）を表示用に整形
pub fn render_state(state: &UploadState) -> String {
    let mut out = String::new();

    if let Some(recipe) = &state.recipe {
        out.push_str(&render_recipe(recipe));
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "⚠ {}", error);
    }
    if let Some(time) = &state.completed_at {
        let _ = writeln!(out, "✔ {}", time);
    }

    out
}
