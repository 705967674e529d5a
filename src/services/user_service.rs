//! Credential store: user records keyed by a unique, case-sensitive login.

use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::utils::password::{hash_password, is_password_hash};
use crate::utils::validation::require_not_blank;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<users::Model>, AppError> {
        let user = Users::find()
            .filter(users::Column::Login.eq(login))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find_by_id(id).one(&self.db).await?)
    }

    pub async fn user_exists(&self, login: &str) -> Result<bool, AppError> {
        let count = Users::find()
            .filter(users::Column::Login.eq(login))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Registers a user from a raw password, which is always hashed here.
    pub async fn create_user(&self, login: &str, password: &str) -> Result<users::Model, AppError> {
        require_not_blank(login, "Login")?;
        require_not_blank(password, "Password")?;

        let password_hash = hash_password(password)?;
        self.insert_user(login, password_hash).await
    }

    /// Registers a user whose password was hashed elsewhere (imports, seeding).
    /// The value must be a hash this backend can later verify against.
    pub async fn create_user_with_hashed_password(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<users::Model, AppError> {
        require_not_blank(login, "Login")?;
        if !is_password_hash(password_hash) {
            return Err(AppError::BadRequest(
                "Password must be supplied as an Argon2 PHC hash".to_string(),
            ));
        }

        self.insert_user(login, password_hash.to_string()).await
    }

    async fn insert_user(
        &self,
        login: &str,
        password_hash: String,
    ) -> Result<users::Model, AppError> {
        tracing::info!("👤 Creating user: {}", login);

        if self.user_exists(login).await? {
            return Err(AppError::Conflict(format!("User {} already exists", login)));
        }

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            login: Set(login.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
        };

        let user = user
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_write(e, &format!("User {} already exists", login)))?;

        tracing::info!("✅ User created: {}", login);
        Ok(user)
    }
}
