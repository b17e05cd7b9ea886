//! Database adapters
//!
//! Implementations of repository traits using SeaORM. SQLite is the default
//! backend; PostgreSQL works through the same code.

pub mod project_repo;
pub mod recipe_repo;
pub mod schema;
pub mod session_repo;
pub mod user_repo;


pub use project_repo::DbProjectRepository;
pub use recipe_repo::DbRecipeRepository;
pub use schema::create_schema;
pub use session_repo::DbSessionRepository;
pub use user_repo::DbUserRepository;

use sea_orm::{DbErr, SqlErr};

use crate::error::DomainError;

/// Map insert failures caused by a unique constraint to `AlreadyExists`
pub(crate) fn map_unique_violation(e: DbErr, what: impl FnOnce() -> String) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyExists(what()),
        _ => DomainError::Database(e.to_string()),
    }
}
