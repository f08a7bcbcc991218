//! 料理写真レシピクライアント
//!
//! 画像選択・プレビュー・予測サーバーへの送信・レシピ正規化を行う。
//! 正規化ロジックと型は `food_recipe_common` にある。

pub mod cli;
pub mod config;
pub mod error;
pub mod preview;
pub mod render;
pub mod selection;
pub mod state;
pub mod upload;
