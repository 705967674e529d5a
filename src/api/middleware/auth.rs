use crate::AppState;
use crate::api::error::AppError;
use crate::entities::users;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Header carrying the raw session token.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Identity resolved from the request token, handed explicitly to handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub users::Model);

/// Reads the raw token from the `auth-token` header, tolerating a `Bearer ` prefix.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.trim_start())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token(req.headers()) else {
        tracing::debug!("Request without auth token: {}", req.uri());
        return Err(AppError::Unauthorized("Unauthorized error".to_string()));
    };

    match state.sessions.validate_token(&token).await {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!("Invalid auth token on {}", req.uri());
            Err(AppError::Unauthorized("Unauthorized error".to_string()))
        }
    }
}
