use crate::error::{FoodRecipeError, Result};
use std::path::Path;
use std::sync::Arc;

/// ユーザーが選択した画像ファイル
///
/// バイト列は `Arc` で共有するため、状態スナップショットへの複製は安価。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// パスから読み込む（MIMEタイプは拡張子から推定）
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(FoodRecipeError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 元ファイル名の拡張子（ドット付き、無ければ空）
    pub fn extension(&self) -> &str {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| &self.file_name[self.file_name.len() - e.len() - 1..])
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_path_guesses_mime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sushi.jpg");
        std::fs::write(&path, b"sushi image").unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.file_name, "sushi.jpg");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(&*file.bytes, b"sushi image");
        assert!(file.is_image());
        assert_eq!(file.len(), 11);
    }

    #[test]
    fn test_from_path_non_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.mime_type, "text/plain");
        assert!(!file.is_image());
    }

    #[test]
    fn test_from_path_missing() {
        let err = SelectedFile::from_path(Path::new("/nonexistent/food.png")).unwrap_err();
        assert!(matches!(err, FoodRecipeError::FileNotFound(_)));
    }

    #[test]
    fn test_extension() {
        assert_eq!(SelectedFile::new("a.PNG", "image/png", Vec::<u8>::new()).extension(), ".PNG");
        assert_eq!(SelectedFile::new("archive.tar.gz", "application/gzip", Vec::<u8>::new()).extension(), ".gz");
        assert_eq!(SelectedFile::new("noext", "image/png", Vec::<u8>::new()).extension(), "");
    }
}
