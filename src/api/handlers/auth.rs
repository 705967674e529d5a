use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::ValidatedJson;
use crate::api::middleware::auth::extract_token;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
pub struct AuthRequest {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    #[serde(rename = "auth-token")]
    pub auth_token: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = AuthRequest,
    responses(
        (status = 201, description = "User registered successfully"),
        (status = 400, description = "Login already exists or input invalid")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AuthRequest>,
) -> Result<StatusCode, AppError> {
    state
        .users
        .create_user(&payload.login, &payload.password)
        .await?;

    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Bad credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AuthRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let bad_credentials = || AppError::BadRequest("Bad credentials".to_string());

    let user = match state
        .sessions
        .authenticate(&payload.login, &payload.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!("Failed login attempt for {}", payload.login);
            return Err(bad_credentials());
        }
        Err(e) => {
            tracing::error!("Login for {} failed: {}", payload.login, e);
            return Err(bad_credentials());
        }
    };

    let auth_token = state.sessions.create_token(&user).await?;
    tracing::info!("🔓 User logged in: {}", user.login);

    Ok(Json(AuthResponse { auth_token }))
}

#[utoipa::path(
    post,
    path = "/logout",
    params(
        ("auth-token" = String, Header, description = "Session token")
    ),
    responses(
        (status = 200, description = "Logged out (always succeeds)")
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = extract_token(&headers) {
        state.sessions.logout(&token).await;
    }
    StatusCode::OK
}
