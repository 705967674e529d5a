//! Token store: persisted session token records.
//!
//! Records are addressed by the digest of the raw secret, so a lookup is a
//! single indexed query instead of a scan over every active token.

use crate::entities::{prelude::*, *};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct TokenStore {
    db: DatabaseConnection,
}

impl TokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        token_hash: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<tokens::Model, DbErr> {
        tokens::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            token_hash: Set(token_hash),
            created_at: Set(created_at),
            expires_at: Set(expires_at),
        }
        .insert(&self.db)
        .await
    }

    /// Finds the token with this digest that is still active at `now`, with its owner.
    pub async fn find_active_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(tokens::Model, users::Model)>, DbErr> {
        let found = Tokens::find()
            .filter(tokens::Column::TokenHash.eq(token_hash))
            .filter(tokens::Column::ExpiresAt.gt(now))
            .find_also_related(Users)
            .one(&self.db)
            .await?;

        Ok(found.and_then(|(token, user)| user.map(|u| (token, u))))
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<u64, DbErr> {
        let res = Tokens::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected)
    }

    /// Deletes every token whose expiry is strictly before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let res = Tokens::delete_many()
            .filter(tokens::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}
