pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::middleware::auth::auth_middleware;
use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::session_service::SessionService;
use crate::services::storage::StorageService;
use crate::services::token_store::TokenStore;
use crate::services::user_service::UserService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::files::upload_file,
        api::handlers::files::download_file,
        api::handlers::files::delete_file,
        api::handlers::files::rename_file,
        api::handlers::files::list_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::AuthRequest,
            api::handlers::auth::AuthResponse,
            api::handlers::files::RenameRequest,
            api::handlers::health::HealthResponse,
            services::file_service::FileInfo,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "files", description = "File management endpoints"),
        (name = "system", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub users: UserService,
    pub sessions: SessionService,
    pub file_service: Arc<FileService>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services over one database connection and content backend.
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        config: AppConfig,
    ) -> Self {
        let users = UserService::new(db.clone());
        let sessions = SessionService::new(
            users.clone(),
            TokenStore::new(db.clone()),
            config.token_ttl(),
        );
        let file_service = Arc::new(FileService::new(db.clone(), storage.clone()));

        Self {
            db,
            storage,
            users,
            sessions,
            file_service,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/file",
            post(api::handlers::files::upload_file)
                .get(api::handlers::files::download_file)
                .delete(api::handlers::files::delete_file)
                .put(api::handlers::files::rename_file),
        )
        .route("/list", get(api::handlers::files::list_files))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout))
        .merge(protected)
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // multipart framing overhead
        ))
        .with_state(state)
}
