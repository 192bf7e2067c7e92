use super::TokenStore;
use crate::auth::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One pretty-printed JSON file per domain inside a directory
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{}.json", domain))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, tokens: &Value, domain: &str) -> Result<(), StorageError> {
        let path = self.path_for(domain);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let contents = serde_json::to_string_pretty(tokens).map_err(|source| StorageError::Json {
            domain: domain.to_string(),
            source,
        })?;

        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        log::debug!("Saved tokens for {} to {:?}", domain, path);
        Ok(())
    }

    async fn load(&self, domain: &str) -> Result<Value, StorageError> {
        let path = self.path_for(domain);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    domain: domain.to_string(),
                });
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        serde_json::from_str(&contents).map_err(|source| StorageError::Json {
            domain: domain.to_string(),
            source,
        })
    }

    async fn has_tokens(&self, domain: &str) -> Result<bool, StorageError> {
        let path = self.path_for(domain);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("amocrm-tokens-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = FileTokenStore::new(scratch_dir());
        let tokens = json!({"access_token": "a", "refresh_token": "r"});

        assert!(!store.has_tokens("acme.amocrm.ru").await.unwrap());
        store.save(&tokens, "acme.amocrm.ru").await.unwrap();

        assert!(store.has_tokens("acme.amocrm.ru").await.unwrap());
        assert_eq!(store.load("acme.amocrm.ru").await.unwrap(), tokens);

        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_load_missing_domain() {
        let store = FileTokenStore::new(scratch_dir());
        let error = store.load("nobody.amocrm.ru").await.unwrap_err();
        assert!(matches!(error, StorageError::NotFound { .. }));
    }
}
