//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod auth_service;
pub mod image_service;
pub mod preloader;
pub mod project_organisation_service;
pub mod project_service;
pub mod recipe_service;

pub use auth_service::{AuthService, LoginSession};
pub use image_service::ImageService;
pub use preloader::Preloader;
pub use project_organisation_service::ProjectOrganisationService;
pub use project_service::{ensure_participant, ProjectService};
pub use recipe_service::RecipeService;
