//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod auth;
pub mod media;
pub mod projects;
pub mod recipes;

use serde::Serialize;

pub use auth::{login, logout, register};
pub use media::{
    delete_project_image, delete_recipe_image, get_project_image, get_recipe_image,
    upload_project_image, upload_recipe_image,
};
pub use projects::{
    create_project, get_invitation_link, get_project, get_project_version, join_project,
    join_project_by_token, leave_project, list_projects, update_project,
};
pub use recipes::{create_recipe, get_recipe, get_recipe_version, list_recipes, update_recipe};

/// Hypermedia links of a listed resource
#[derive(Debug, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_href: String,
    pub image: String,
}

impl Links {
    /// Links of `/<collection>/<id>` and its picture under `/media`
    pub fn new(base_url: &str, collection: &str, id: i32) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            self_href: format!("{}/{}/{}", base_url, collection, id),
            image: format!("{}/media/{}/{}/image", base_url, collection, id),
        }
    }
}
