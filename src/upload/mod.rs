//! 画像アップロードクライアント
//!
//! 送信結果を次のいずれかに分類する:
//! - Transport: 接続レベルの失敗
//! - Server: 2xx以外（本文の `message` があれば使用、無ければ "Server error"）
//! - NoData: 2xxだが本文が無い・JSONでない
//! - Completed: 正規化済みレシピ（情報不足フラグ付き）

mod transport;

pub use transport::{
    HttpTransport, PredictTransport, TransportError, TransportResponse, FILE_FIELD, FOOD_INFO_PATH,
    PREDICT_PATH,
};

use crate::selection::SelectedFile;
use chrono::{Local, NaiveTime};
use food_recipe_common::{normalize_value, NormalizeError, Normalized};
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_SERVER_MESSAGE: &str = "Server error";

/// ユーザーに表示するアップロード失敗（Displayがそのまま表示文言）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Error uploading image: {0}")]
    Transport(String),

    #[error("Error uploading image: {message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Completed {
        normalized: Normalized,
        /// `h:mm AM/PM` 形式の完了時刻
        completed_at: String,
    },
    Failed(UploadError),
}

pub struct UploadClient<T: PredictTransport> {
    transport: T,
}

impl<T: PredictTransport> UploadClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 画像をアップロードする（ファイル未選択なら何もしない）
    pub async fn upload(&self, file: Option<&SelectedFile>) -> Option<UploadOutcome> {
        match file {
            Some(file) => Some(self.send(file).await),
            None => None,
        }
    }

    /// 選択済みファイルを送信して結果を分類する
    pub async fn send(&self, file: &SelectedFile) -> UploadOutcome {
        if !file.is_image() {
            // 判定はサーバー側に任せる
            tracing::warn!(file = %file.file_name, mime = %file.mime_type, "uploading file without image MIME type");
        }

        match self.transport.post_image(file).await {
            Ok(response) => classify(response, |value| value),
            Err(e) => transport_failure(e),
        }
    }

    /// 料理名からレシピ情報を取得する
    ///
    /// サーバーは `llm_info` 相当のオブジェクトのみを返すため、
    /// 予測レスポンスの形に包んでから正規化する。
    pub async fn food_info(&self, food: &str) -> UploadOutcome {
        match self.transport.get_food_info(food).await {
            Ok(response) => classify(response, |llm_info| {
                if llm_info.is_null() {
                    Value::Null
                } else {
                    json!({ "predicted_food": food, "llm_info": llm_info })
                }
            }),
            Err(e) => transport_failure(e),
        }
    }
}

fn transport_failure(e: TransportError) -> UploadOutcome {
    tracing::error!(error = %e, "upload failed: transport");
    UploadOutcome::Failed(UploadError::Transport(e.0))
}

fn classify(response: TransportResponse, wrap: impl FnOnce(Value) -> Value) -> UploadOutcome {
    if !response.is_success() {
        let message = server_message(&response.body);
        tracing::error!(status = response.status, %message, "upload failed: server error");
        return UploadOutcome::Failed(UploadError::Server {
            status: response.status,
            message,
        });
    }

    let body = serde_json::from_slice::<Value>(&response.body).unwrap_or(Value::Null);
    match normalize_value(&wrap(body)) {
        Ok(normalized) => {
            if let Some(warning) = normalized.warning() {
                tracing::warn!(predicted_food = ?normalized.view.predicted_food, "{}", warning);
            }
            UploadOutcome::Completed {
                normalized,
                completed_at: completion_timestamp(),
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "upload failed: empty payload");
            UploadOutcome::Failed(e.into())
        }
    }
}

/// エラーレスポンス本文から `message` を取り出す
pub fn server_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_MESSAGE.to_string())
}

/// 現在時刻を `h:mm AM/PM` で返す
pub fn completion_timestamp() -> String {
    format_clock(Local::now().time())
}

pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}
