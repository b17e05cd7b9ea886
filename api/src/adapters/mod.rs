//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod database;
pub mod filesystem;

pub use database::{
    create_schema, DbProjectRepository, DbRecipeRepository, DbSessionRepository, DbUserRepository,
};
pub use filesystem::FsImageStore;
