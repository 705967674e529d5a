mod common;

use chrono::{Duration, Utc};
use rust_cloud_storage::api::error::AppError;
use rust_cloud_storage::services::token_store::TokenStore;
use rust_cloud_storage::services::user_service::UserService;
use rust_cloud_storage::services::worker::BackgroundWorker;
use rust_cloud_storage::utils::hash::{generate_token, token_digest};
use rust_cloud_storage::utils::password::hash_password;
use sea_orm::ConnectionTrait;

#[tokio::test]
async fn test_authenticate() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let found = sessions.authenticate("alice", "secret").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(alice.id));

    assert!(sessions.authenticate("alice", "wrong").await.unwrap().is_none());
    assert!(sessions.authenticate("bob", "secret").await.unwrap().is_none());
    // Logins are case-sensitive
    assert!(sessions.authenticate("Alice", "secret").await.unwrap().is_none());
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let db = common::setup_test_db().await;
    let alice = common::create_user(&db, "alice", "secret").await;

    assert_ne!(alice.password_hash, "secret");
    assert!(alice.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_create_and_validate_token() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let token = sessions.create_token(&alice).await.unwrap();
    assert_eq!(token.len(), 43);

    let user = sessions.validate_token(&token).await.unwrap();
    assert_eq!(user.id, alice.id);
    assert_eq!(user.login, "alice");

    assert!(sessions.validate_token("").await.is_none());
    assert!(sessions.validate_token("   ").await.is_none());
    assert!(sessions.validate_token("not-a-real-token").await.is_none());
}

#[tokio::test]
async fn test_raw_token_is_never_persisted() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let token = sessions.create_token(&alice).await.unwrap();
    let store = TokenStore::new(db.clone());

    let (record, owner) = store
        .find_active_by_hash(&token_digest(&token), Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.id, alice.id);
    assert_ne!(record.token_hash, token);
    assert!(store
        .find_active_by_hash(&token, Utc::now())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_multiple_tokens_per_user() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let first = sessions.create_token(&alice).await.unwrap();
    let second = sessions.create_token(&alice).await.unwrap();
    assert_ne!(first, second);

    assert_eq!(common::active_token_count(&db, &alice.id).await, 2);

    // Revoking one session leaves the other usable
    sessions.logout(&first).await;
    assert!(sessions.validate_token(&first).await.is_none());
    assert_eq!(
        sessions.validate_token(&second).await.map(|u| u.id),
        Some(alice.id)
    );
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let raw = generate_token();
    let issued = Utc::now() - Duration::hours(2);
    TokenStore::new(db.clone())
        .insert(&alice.id, token_digest(&raw), issued, issued + Duration::hours(1))
        .await
        .unwrap();

    assert!(sessions.validate_token(&raw).await.is_none());
}

#[tokio::test]
async fn test_token_expires_after_ttl() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::milliseconds(300));
    let alice = common::create_user(&db, "alice", "secret").await;

    let token = sessions.create_token(&alice).await.unwrap();
    assert!(sessions.validate_token(&token).await.is_some());

    tokio::time::sleep(std::time::Duration::from_millis(600)).await;
    assert!(sessions.validate_token(&token).await.is_none());
}

#[tokio::test]
async fn test_cleanup_removes_only_expired_tokens() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let store = TokenStore::new(db.clone());
    let alice = common::create_user(&db, "alice", "secret").await;

    let past = Utc::now() - Duration::days(2);
    for _ in 0..2 {
        store
            .insert(&alice.id, token_digest(&generate_token()), past, past + Duration::hours(1))
            .await
            .unwrap();
    }
    let live = sessions.create_token(&alice).await.unwrap();
    assert_eq!(common::token_count(&db).await, 3);

    assert_eq!(sessions.cleanup_expired_tokens().await.unwrap(), 2);
    assert_eq!(common::token_count(&db).await, 1);
    assert!(sessions.validate_token(&live).await.is_some());

    // Nothing left to sweep
    assert_eq!(sessions.cleanup_expired_tokens().await.unwrap(), 0);
}

#[tokio::test]
async fn test_logout() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;

    let token = sessions.create_token(&alice).await.unwrap();
    sessions.logout(&token).await;
    assert!(sessions.validate_token(&token).await.is_none());

    // Repeated, unknown and blank logouts are silent no-ops
    sessions.logout(&token).await;
    sessions.logout("unknown-token").await;
    sessions.logout("").await;
    assert_eq!(common::token_count(&db).await, 0);
}

#[tokio::test]
async fn test_duplicate_login_conflicts() {
    let db = common::setup_test_db().await;
    let users = UserService::new(db.clone());
    users.create_user("alice", "secret").await.unwrap();

    let err = users.create_user("alice", "other").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Distinct case is a distinct login
    users.create_user("Alice", "other").await.unwrap();
    assert!(users.user_exists("Alice").await.unwrap());
}

#[tokio::test]
async fn test_blank_credentials_rejected() {
    let db = common::setup_test_db().await;
    let users = UserService::new(db.clone());

    assert!(matches!(
        users.create_user("", "secret").await.unwrap_err(),
        AppError::BadRequest(_)
    ));
    assert!(matches!(
        users.create_user("alice", "  ").await.unwrap_err(),
        AppError::BadRequest(_)
    ));
    assert!(!users.user_exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_create_user_with_hashed_password() {
    let db = common::setup_test_db().await;
    let users = UserService::new(db.clone());
    let sessions = common::sessions(&db, Duration::hours(24));

    let hash = hash_password("imported").unwrap();
    let user = users
        .create_user_with_hashed_password("carol", &hash)
        .await
        .unwrap();
    assert_eq!(user.password_hash, hash);
    assert!(sessions.authenticate("carol", "imported").await.unwrap().is_some());

    let err = users
        .create_user_with_hashed_password("dave", "plaintext")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(users.find_by_login("dave").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_id() {
    let db = common::setup_test_db().await;
    let users = UserService::new(db.clone());
    let alice = common::create_user(&db, "alice", "secret").await;

    let found = users.find_by_id(&alice.id).await.unwrap().unwrap();
    assert_eq!(found.login, "alice");
    assert!(users.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_storage_faults_fail_closed() {
    let db = common::setup_test_db().await;
    let sessions = common::sessions(&db, Duration::hours(24));
    let alice = common::create_user(&db, "alice", "secret").await;
    let token = sessions.create_token(&alice).await.unwrap();

    db.execute_unprepared("DROP TABLE tokens").await.unwrap();

    // Lookups now error inside the store; both calls report "no identity"
    assert!(sessions.validate_token(&token).await.is_none());
    sessions.logout(&token).await;

    assert!(sessions.cleanup_expired_tokens().await.is_err());
}

#[tokio::test]
async fn test_worker_sweeps_and_stops() {
    let (state, _dir) = common::setup_state().await;
    let store = TokenStore::new(state.db.clone());
    let alice = common::create_user(&state.db, "alice", "secret").await;

    let past = Utc::now() - Duration::days(1);
    store
        .insert(&alice.id, token_digest(&generate_token()), past, past + Duration::hours(1))
        .await
        .unwrap();
    state.file_service.store(&alice, "a.txt", b"a").await.unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = BackgroundWorker::new(
        state.sessions.clone(),
        state.file_service.clone(),
        std::time::Duration::from_secs(3600),
        shutdown_rx,
    );
    assert_eq!(worker.perform_cleanup().await, 1);
    assert_eq!(common::token_count(&state.db).await, 0);
    // The sweep already released alice's idle lock
    assert_eq!(state.file_service.release_idle_locks(), 0);

    let handle = tokio::spawn(worker.run());
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_worker_survives_sweep_failure() {
    let (state, _dir) = common::setup_state().await;
    state
        .db
        .execute_unprepared("DROP TABLE tokens")
        .await
        .unwrap();

    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = BackgroundWorker::new(
        state.sessions.clone(),
        state.file_service.clone(),
        std::time::Duration::from_secs(3600),
        shutdown_rx,
    );
    assert_eq!(worker.perform_cleanup().await, 0);
}
