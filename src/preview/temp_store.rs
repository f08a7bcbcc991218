//! 一時ディレクトリを使うプレビューストア
//!
//! 選択画像のコピーをセッション用一時ディレクトリに書き出し、
//! `file://` URLとして発行する。失効でコピーを削除し、
//! ストア破棄時にディレクトリごと消える。

use super::{PreviewStore, PreviewUrl};
use crate::error::{FoodRecipeError, Result};
use crate::selection::SelectedFile;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TempPreviewStore {
    dir: TempDir,
    seq: u64,
    issued: HashMap<PreviewUrl, PathBuf>,
}

impl TempPreviewStore {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("food-recipe-preview-")
            .tempdir()?;
        Ok(Self {
            dir,
            seq: 0,
            issued: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// 発行済みで未失効のプレビュー数
    pub fn active(&self) -> usize {
        self.issued.len()
    }
}

impl PreviewStore for TempPreviewStore {
    fn create(&mut self, file: &SelectedFile) -> Result<PreviewUrl> {
        self.seq += 1;
        let digest = hex::encode(Sha256::digest(&file.bytes));
        let name = format!("{}-{}{}", self.seq, &digest[..16], file.extension());
        let path = self.dir.path().join(name);

        std::fs::write(&path, &file.bytes)?;

        let url = PreviewUrl::new(format!("file://{}", path.display()));
        self.issued.insert(url.clone(), path);
        Ok(url)
    }

    fn revoke(&mut self, url: &PreviewUrl) -> Result<()> {
        let path = self
            .issued
            .remove(url)
            .ok_or_else(|| FoodRecipeError::Preview(format!("未発行のプレビュー: {}", url)))?;
        std::fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str, bytes: &[u8]) -> SelectedFile {
        SelectedFile::new(name, "image/jpeg", bytes.to_vec())
    }

    #[test]
    fn test_create_writes_copy() {
        let mut store = TempPreviewStore::new().unwrap();
        let url = store.create(&jpeg("sushi.jpg", b"sushi")).unwrap();

        let path = url.as_str().strip_prefix("file://").unwrap();
        assert!(path.ends_with(".jpg"));
        assert_eq!(std::fs::read(path).unwrap(), b"sushi");
        assert_eq!(store.active(), 1);
    }

    #[test]
    fn test_same_bytes_get_distinct_urls() {
        let mut store = TempPreviewStore::new().unwrap();
        let a = store.create(&jpeg("a.jpg", b"same")).unwrap();
        let b = store.create(&jpeg("b.jpg", b"same")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_revoke_removes_copy() {
        let mut store = TempPreviewStore::new().unwrap();
        let url = store.create(&jpeg("rendang.jpg", b"rendang")).unwrap();
        let path = url.as_str().strip_prefix("file://").unwrap().to_string();

        store.revoke(&url).unwrap();
        assert!(!Path::new(&path).exists());
        assert_eq!(store.active(), 0);
    }

    #[test]
    fn test_revoke_twice_fails() {
        let mut store = TempPreviewStore::new().unwrap();
        let url = store.create(&jpeg("x.jpg", b"x")).unwrap();
        store.revoke(&url).unwrap();

        let err = store.revoke(&url).unwrap_err();
        assert!(matches!(err, FoodRecipeError::Preview(_)));
    }
}
