//! Session lifecycle: credential checks and opaque token issue/validate/revoke.
//!
//! Validation and logout fail closed: a storage fault is logged and reported
//! as "no identity" rather than propagated.

use crate::api::error::AppError;
use crate::entities::users;
use crate::services::token_store::TokenStore;
use crate::services::user_service::UserService;
use crate::utils::hash::{generate_token, token_digest};
use crate::utils::password::verify_password;
use chrono::{Duration, Utc};

#[derive(Clone)]
pub struct SessionService {
    users: UserService,
    tokens: TokenStore,
    ttl: Duration,
}

impl SessionService {
    pub fn new(users: UserService, tokens: TokenStore, ttl: Duration) -> Self {
        Self { users, tokens, ttl }
    }

    /// Returns the user iff `login` exists and `password` matches its hash.
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<users::Model>, AppError> {
        let Some(user) = self.users.find_by_login(login).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Issues a new token for `user` and returns the raw secret.
    /// This is the only place the raw value ever exists in cleartext.
    pub async fn create_token(&self, user: &users::Model) -> Result<String, AppError> {
        let raw_token = generate_token();
        let now = Utc::now();

        self.tokens
            .insert(&user.id, token_digest(&raw_token), now, now + self.ttl)
            .await?;

        tracing::debug!("🔑 Issued session token for user: {}", user.login);
        Ok(raw_token)
    }

    /// Resolves a raw token to its owner, or `None` if blank, unknown, expired,
    /// or if the token store could not be read.
    pub async fn validate_token(&self, raw_token: &str) -> Option<users::Model> {
        if raw_token.trim().is_empty() {
            return None;
        }

        match self
            .tokens
            .find_active_by_hash(&token_digest(raw_token), Utc::now())
            .await
        {
            Ok(Some((_, user))) => {
                tracing::debug!("Token accepted for user: {}", user.login);
                Some(user)
            }
            Ok(None) => {
                tracing::debug!("Token rejected: unknown or expired");
                None
            }
            Err(e) => {
                tracing::error!("Token validation failed: {}", e);
                None
            }
        }
    }

    /// Revokes the matching active token. Unknown or blank tokens are a no-op.
    pub async fn logout(&self, raw_token: &str) {
        if raw_token.trim().is_empty() {
            return;
        }

        let found = match self
            .tokens
            .find_active_by_hash(&token_digest(raw_token), Utc::now())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Logout lookup failed: {}", e);
                return;
            }
        };

        match found {
            Some((token, user)) => match self.tokens.delete_by_id(&token.id).await {
                Ok(_) => tracing::debug!("👋 User logged out: {}", user.login),
                Err(e) => tracing::error!("Logout failed: {}", e),
            },
            None => tracing::debug!("Logout token not found"),
        }
    }

    /// Removes all tokens already past expiry and returns how many were deleted.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let deleted = self.tokens.delete_expired(Utc::now()).await?;
        tracing::info!("🧹 Expired tokens removed: {}", deleted);
        Ok(deleted)
    }
}
