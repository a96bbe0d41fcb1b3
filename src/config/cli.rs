use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Reads files relative to a base directory. Absolute paths bypass the base.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        tracing::debug!("Reading {}", full_path.display());
        let data = fs::read(full_path)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_relative_and_absolute() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model.json"), b"{}").unwrap();

        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        assert_eq!(storage.read_file("model.json").await.unwrap(), b"{}");

        let absolute = dir.path().join("model.json");
        let other = LocalStorage::new("/nonexistent".to_string());
        assert_eq!(
            other.read_file(absolute.to_str().unwrap()).await.unwrap(),
            b"{}"
        );

        assert!(storage.read_file("missing.json").await.is_err());
    }
}
