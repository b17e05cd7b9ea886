//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod image;
pub mod project;
pub mod recipe;
pub mod user;

pub use image::{ImageOwner, StoredImage};
pub use project::{
    AllergenPerson, LeaveOutcome, PersonNumberChange, Project, ProjectContent, ProjectId,
    ProjectStub, RecipeForProject, UnitConversion, VersionNumbers,
};
pub use recipe::{DietaryKind, Ingredient, Recipe, RecipeContent, RecipeId, RecipeStub};
pub use user::{NewUser, Session, User, UserId};
