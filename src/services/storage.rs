use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Content blob backend addressed by relative storage keys (`<user_id>/<filename>`).
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_file(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn get_file(&self, key: &str) -> Result<Vec<u8>>;
    /// Removing a missing blob is not an error.
    async fn delete_file(&self, key: &str) -> Result<()>;
    /// Fails if `dest_key` already exists.
    async fn move_file(&self, source_key: &str, dest_key: &str) -> Result<()>;
    /// Reachability check used by the health endpoint.
    async fn health_check(&self) -> bool;
}

/// Stores blobs as plain files below a root directory.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a key below the root, refusing anything that could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(anyhow!("Invalid storage key: {:?}", key));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn upload_file(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        Self::ensure_parent(&path).await?;
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        let data = fs::read(&path).await?;
        Ok(data)
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn move_file(&self, source_key: &str, dest_key: &str) -> Result<()> {
        let source = self.resolve(source_key)?;
        let dest = self.resolve(dest_key)?;

        if fs::try_exists(&dest).await? {
            return Err(anyhow!("Destination already exists: {}", dest_key));
        }

        Self::ensure_parent(&dest).await?;
        if let Err(e) = fs::rename(&source, &dest).await {
            tracing::error!(
                "Local move failed: source={}, dest={}, error={:?}",
                source_key,
                dest_key,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
