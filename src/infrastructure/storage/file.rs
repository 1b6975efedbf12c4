//! File-backed storage: one JSON file per key

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::SessionStorage;
use crate::domain::{DomainError, DomainResult};

/// Persists each key as `<dir>/<key>.json`, so a session outlives the
/// process the way browser local storage outlives a page.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> DomainResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DomainError::Validation(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn storage_err(action: &str, path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Storage(format!("{} {}: {}", action, path.display(), e))
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("read", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> DomainResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_err("create", &self.dir, e))?;

        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| storage_err("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_err("rename", &path, e))?;

        debug!(path = %path.display(), "Session record written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("nested"));
        storage.set("user", "{\"id\":\"1\"}".into()).await.unwrap();

        let reopened = FileSessionStorage::new(dir.path().join("nested"));
        assert_eq!(
            reopened.get("user").await.unwrap().as_deref(),
            Some("{\"id\":\"1\"}")
        );
    }

    #[tokio::test]
    async fn missing_key_reads_as_none_and_removes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        assert_eq!(storage.get("user").await.unwrap(), None);
        storage.remove("user").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        let err = storage.set("../escape", "x".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
