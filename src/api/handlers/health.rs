use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.ping().await.is_ok();
    let storage_ok = state.storage.health_check().await;

    Json(HealthResponse {
        status: status(db_ok && storage_ok, "ok", "degraded"),
        database: status(db_ok, "connected", "disconnected"),
        storage: status(storage_ok, "available", "unavailable"),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn status(ok: bool, up: &str, down: &str) -> String {
    let value = if ok { up } else { down };
    value.to_string()
}
