//! プレビューURL管理モジュール
//!
//! 選択中ファイルから派生する一時プレビューURLのライフサイクルを扱う。
//!
//! - 同時に有効なプレビューURLは高々1つ
//! - 差し替え前に必ず旧URLを失効させる
//! - 破棄時（Drop）に保持中のURLを失効させる
//! - プレビューURLが存在する ⇔ 選択ファイルが存在する

mod temp_store;

pub use temp_store::TempPreviewStore;

use crate::error::Result;
use crate::selection::SelectedFile;
use std::fmt;

/// 失効可能なプレビュー参照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// プレビューURLの発行・失効を行うバックエンド
pub trait PreviewStore {
    fn create(&mut self, file: &SelectedFile) -> Result<PreviewUrl>;
    fn revoke(&mut self, url: &PreviewUrl) -> Result<()>;
}

/// 選択ファイルとプレビューURLの唯一の所有者
pub struct PreviewManager<S: PreviewStore> {
    store: S,
    file: Option<SelectedFile>,
    url: Option<PreviewUrl>,
}

impl<S: PreviewStore> PreviewManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            file: None,
            url: None,
        }
    }

    /// ファイルを選択（`None` で選択解除）
    ///
    /// 発行に失敗した場合はファイル・URLとも空のままエラーを返す。
    pub fn select(&mut self, file: Option<SelectedFile>) -> Result<()> {
        self.revoke_current();
        self.file = None;

        let Some(file) = file else {
            return Ok(());
        };

        let url = self.store.create(&file).map_err(|e| {
            tracing::error!(file = %file.file_name, error = %e, "failed to create preview");
            e
        })?;
        tracing::debug!(file = %file.file_name, url = %url, "preview created");

        self.file = Some(file);
        self.url = Some(url);
        Ok(())
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn url(&self) -> Option<&PreviewUrl> {
        self.url.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn revoke_current(&mut self) {
        if let Some(url) = self.url.take() {
            match self.store.revoke(&url) {
                Ok(()) => tracing::debug!(url = %url, "preview revoked"),
                Err(e) => tracing::warn!(url = %url, error = %e, "failed to revoke preview"),
            }
        }
    }
}

impl<S: PreviewStore> Drop for PreviewManager<S> {
    fn drop(&mut self) {
        self.revoke_current();
    }
}
