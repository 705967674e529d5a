use crate::services::storage::LocalStorageService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(storage_path: &str) -> anyhow::Result<Arc<LocalStorageService>> {
    let root = PathBuf::from(storage_path);

    info!("💾 File storage root: {}", root.display());

    if !tokio::fs::try_exists(&root).await? {
        info!("📁 Storage root not found, creating...");
        tokio::fs::create_dir_all(&root).await?;
    }

    Ok(Arc::new(LocalStorageService::new(root)))
}
