//! 予測サーバーとの通信
//!
//! `PredictTransport` は接続レベルの送受信のみを担当し、
//! HTTPステータスの解釈は `UploadClient` が行う。

use crate::config::Config;
use crate::error::Result;
use crate::selection::SelectedFile;
use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const PREDICT_PATH: &str = "/predict_food_class/";
pub const FOOD_INFO_PATH: &str = "/get_food_info/";

/// マルチパートのファイルフィールド名
pub const FILE_FIELD: &str = "file";

/// 接続レベルの失敗（送信不能・タイムアウト・本文読み込み失敗）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// ステータスと本文のみの生レスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait PredictTransport {
    /// 画像を1パートのマルチパートで送信する
    fn post_image(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = std::result::Result<TransportResponse, TransportError>>;

    /// 料理名からレシピ情報を取得する
    fn get_food_info(
        &self,
        food: &str,
    ) -> impl Future<Output = std::result::Result<TransportResponse, TransportError>>;
}

/// reqwestによる実装
pub struct HttpTransport {
    client: reqwest::Client,
    config: Config,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn read(response: reqwest::Response) -> std::result::Result<TransportResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

impl PredictTransport for HttpTransport {
    async fn post_image(&self, file: &SelectedFile) -> std::result::Result<TransportResponse, TransportError> {
        // 種別不明のファイルはブラウザと同じく octet-stream で送る
        let mime = if file.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            file.mime_type.as_str()
        };
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(mime)?;
        let form = Form::new().part(FILE_FIELD, part);

        let url = self.config.endpoint(PREDICT_PATH);
        tracing::debug!(%url, file = %file.file_name, size = file.len(), "POST image");

        let response = self.client.post(url).multipart(form).send().await?;
        Self::read(response).await
    }

    async fn get_food_info(&self, food: &str) -> std::result::Result<TransportResponse, TransportError> {
        let mut url = reqwest::Url::parse(&self.config.endpoint(FOOD_INFO_PATH))
            .map_err(|e| TransportError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError(format!("invalid server url: {}", self.config.server_url)))?
            .pop_if_empty()
            .push(food);

        tracing::debug!(%url, "GET food info");

        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }
}
