//! Database adapter for SessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::entities::{Session, UserId};
use crate::domain::ports::SessionRepository;
use crate::entity::sessions;
use crate::error::DomainError;

/// SeaORM implementation of SessionRepository
pub struct DbSessionRepository {
    db: DatabaseConnection,
}

impl DbSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), DomainError> {
        sessions::ActiveModel {
            token_hash: Set(session.token_hash.clone()),
            user_id: Set(session.user_id.0),
            created_at: Set(session.created_at.fixed_offset()),
            expires_at: Set(session.expires_at.fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError> {
        let result = sessions::Entity::find_by_id(token_hash.to_string())
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), DomainError> {
        sessions::Entity::delete_by_id(token_hash.to_string())
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now.fixed_offset()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Convert SeaORM model to domain entity
impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Session {
            token_hash: model.token_hash,
            user_id: UserId(model.user_id),
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.with_timezone(&Utc),
        }
    }
}
