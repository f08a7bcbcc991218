//! エラー型定義

use thiserror::Error;

/// 正規化の失敗（ペイロード自体が無い場合のみ）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("No data received from server.")]
    NoData,
}
