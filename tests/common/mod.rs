#![allow(dead_code)]

use rust_cloud_storage::AppState;
use rust_cloud_storage::config::AppConfig;
use rust_cloud_storage::entities::{prelude::*, *};
use rust_cloud_storage::infrastructure::{database, storage};
use rust_cloud_storage::services::session_service::SessionService;
use rust_cloud_storage::services::token_store::TokenStore;
use rust_cloud_storage::services::user_service::UserService;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use tempfile::TempDir;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// Full application state over an in-memory database and a temporary content root.
/// The `TempDir` must outlive the state.
pub async fn setup_state() -> (AppState, TempDir) {
    setup_state_with(AppConfig::default()).await
}

/// Same as `setup_state`, keeping the remaining fields of `config`.
pub async fn setup_state_with(config: AppConfig) -> (AppState, TempDir) {
    let db = setup_test_db().await;
    let dir = TempDir::new().unwrap();
    let storage = storage::setup_storage(dir.path().to_str().unwrap())
        .await
        .unwrap();

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        storage_path: dir.path().to_string_lossy().into_owned(),
        ..config
    };

    (AppState::new(db, storage, config), dir)
}

pub fn sessions(db: &DatabaseConnection, ttl: chrono::Duration) -> SessionService {
    SessionService::new(
        UserService::new(db.clone()),
        TokenStore::new(db.clone()),
        ttl,
    )
}

pub async fn create_user(db: &DatabaseConnection, login: &str, password: &str) -> users::Model {
    UserService::new(db.clone())
        .create_user(login, password)
        .await
        .unwrap()
}

pub async fn token_count(db: &DatabaseConnection) -> u64 {
    Tokens::find().count(db).await.unwrap()
}

pub async fn active_token_count(db: &DatabaseConnection, user_id: &str) -> u64 {
    Tokens::find()
        .filter(tokens::Column::UserId.eq(user_id))
        .filter(tokens::Column::ExpiresAt.gt(Utc::now()))
        .count(db)
        .await
        .unwrap()
}
