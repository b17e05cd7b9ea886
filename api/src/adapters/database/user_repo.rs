//! Database adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::map_unique_violation;
use crate::domain::entities::{NewUser, User, UserId};
use crate::domain::ports::UserRepository;
use crate::entity::{credentials, users};
use crate::error::DomainError;

/// SeaORM implementation of UserRepository
pub struct DbUserRepository {
    db: DatabaseConnection,
}

impl DbUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let txn = self.db.begin().await?;

        let created = users::ActiveModel {
            name: Set(user.name.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, || format!("User '{}'", user.name)))?;

        credentials::ActiveModel {
            user_id: Set(created.id),
            password_hash: Set(user.password_hash.clone()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(created.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn get_password_hash(&self, id: &UserId) -> Result<Option<String>, DomainError> {
        let result = credentials::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.password_hash))
    }
}

/// Convert SeaORM model to domain entity
impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            name: model.name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
