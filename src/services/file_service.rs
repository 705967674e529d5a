//! Per-user file store: content blobs plus `(user, filename)`-unique metadata.
//!
//! Mutations for one user are serialized through a keyed lock, and the
//! unique index on `user_files(user_id, filename)` backs that up across
//! processes. Content and metadata are ordered so that a failure never leaves
//! a record pointing at a blob that was not written or moved.

use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::storage::StorageService;
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::validation::validate_filename;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Staged uploads live outside every user directory (user ids never start with a dot).
const STAGING_PREFIX: &str = ".staging";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileInfo {
    pub filename: String,
    pub size: i64,
}

pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    user_locks: KeyedMutex,
}

fn storage_key(user: &users::Model, filename: &str) -> String {
    format!("{}/{}", user.id, filename)
}

impl FileService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>) -> Self {
        Self {
            db,
            storage,
            user_locks: KeyedMutex::new(),
        }
    }

    /// Drops per-user locks nobody is holding; returns how many were released.
    pub fn release_idle_locks(&self) -> usize {
        self.user_locks.cleanup()
    }

    async fn find_record(
        &self,
        user: &users::Model,
        filename: &str,
    ) -> Result<Option<user_files::Model>, AppError> {
        let record = UserFiles::find()
            .filter(user_files::Column::UserId.eq(&user.id))
            .filter(user_files::Column::Filename.eq(filename))
            .one(&self.db)
            .await?;
        Ok(record)
    }

    async fn require_record(
        &self,
        user: &users::Model,
        filename: &str,
    ) -> Result<user_files::Model, AppError> {
        self.find_record(user, filename)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn exists(&self, user: &users::Model, filename: &str) -> Result<bool, AppError> {
        let count = UserFiles::find()
            .filter(user_files::Column::UserId.eq(&user.id))
            .filter(user_files::Column::Filename.eq(filename))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Stores `content` under `filename`. Fails with `Conflict` if the name is taken.
    pub async fn store(
        &self,
        user: &users::Model,
        filename: &str,
        content: &[u8],
    ) -> Result<(), AppError> {
        validate_filename(filename)?;
        let _lock = self.user_locks.lock(&user.id).await;

        if self.exists(user, filename).await? {
            return Err(AppError::Conflict("File already exists".to_string()));
        }

        // 1. Write content to a staging key
        let staging_key = format!("{}/{}", STAGING_PREFIX, Uuid::new_v4());
        self.storage
            .upload_file(&staging_key, content)
            .await
            .map_err(|e| AppError::Storage(format!("Write failed: {}", e)))?;

        // 2. Claim the name
        let final_key = storage_key(user, filename);
        let record = user_files::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user.id.clone()),
            filename: Set(filename.to_string()),
            size: Set(content.len() as i64),
            storage_key: Set(final_key.clone()),
            uploaded_at: Set(Utc::now()),
        };

        let record = match record.insert(&self.db).await {
            Ok(record) => record,
            Err(e) => {
                let _ = self.storage.delete_file(&staging_key).await;
                return Err(AppError::from_write(e, "File already exists"));
            }
        };

        // 3. Promote the staged blob
        if let Err(e) = self.storage.move_file(&staging_key, &final_key).await {
            tracing::error!("Failed to promote staged upload {}: {}", staging_key, e);
            let _ = self.storage.delete_file(&staging_key).await;
            if let Err(db_err) = UserFiles::delete_by_id(&record.id).exec(&self.db).await {
                tracing::error!("Failed to roll back record {}: {}", record.id, db_err);
            }
            return Err(AppError::Storage(format!("Write failed: {}", e)));
        }

        tracing::info!(
            "📁 Stored file {} ({} bytes) for user {}",
            filename,
            content.len(),
            user.login
        );
        Ok(())
    }

    pub async fn load(&self, user: &users::Model, filename: &str) -> Result<Vec<u8>, AppError> {
        let record = self.require_record(user, filename).await?;

        self.storage.get_file(&record.storage_key).await.map_err(|e| {
            tracing::error!(
                "Content unreadable for record {} ({}): {}",
                record.id,
                record.storage_key,
                e
            );
            AppError::Storage(format!("Read failed: {}", e))
        })
    }

    pub async fn delete(&self, user: &users::Model, filename: &str) -> Result<(), AppError> {
        let _lock = self.user_locks.lock(&user.id).await;
        let record = self.require_record(user, filename).await?;

        self.storage
            .delete_file(&record.storage_key)
            .await
            .map_err(|e| AppError::Storage(format!("Delete failed: {}", e)))?;

        UserFiles::delete_by_id(&record.id).exec(&self.db).await?;

        tracing::info!("🗑️  Deleted file {} for user {}", filename, user.login);
        Ok(())
    }

    /// Renames `old_name` to `new_name`. The record changes only after the
    /// content has moved; a failed move leaves the original fully intact.
    pub async fn rename(
        &self,
        user: &users::Model,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), AppError> {
        validate_filename(new_name)?;
        let _lock = self.user_locks.lock(&user.id).await;

        let record = self.require_record(user, old_name).await?;
        if self.exists(user, new_name).await? {
            return Err(AppError::Conflict(
                "File with the new name already exists".to_string(),
            ));
        }

        let old_key = record.storage_key.clone();
        let new_key = storage_key(user, new_name);

        self.storage
            .move_file(&old_key, &new_key)
            .await
            .map_err(|e| AppError::Storage(format!("Move failed: {}", e)))?;

        let mut active = record.into_active_model();
        active.filename = Set(new_name.to_string());
        active.storage_key = Set(new_key.clone());

        if let Err(e) = active.update(&self.db).await {
            if let Err(undo) = self.storage.move_file(&new_key, &old_key).await {
                tracing::error!(
                    "Failed to restore content {} -> {} after rename error: {}",
                    new_key,
                    old_key,
                    undo
                );
            }
            return Err(AppError::from_write(
                e,
                "File with the new name already exists",
            ));
        }

        tracing::info!(
            "✏️  Renamed file {} -> {} for user {}",
            old_name,
            new_name,
            user.login
        );
        Ok(())
    }

    /// Lists the user's files, most recently uploaded first. A positive
    /// `limit` truncates the result; anything else returns everything.
    pub async fn list(
        &self,
        user: &users::Model,
        limit: Option<i64>,
    ) -> Result<Vec<FileInfo>, AppError> {
        let mut query = UserFiles::find()
            .filter(user_files::Column::UserId.eq(&user.id))
            .order_by_desc(user_files::Column::UploadedAt);

        if let Some(limit) = limit.filter(|l| *l > 0) {
            query = query.limit(limit as u64);
        }

        let files = query.all(&self.db).await?;

        Ok(files
            .into_iter()
            .map(|f| FileInfo {
                filename: f.filename,
                size: f.size,
            })
            .collect())
    }
}
