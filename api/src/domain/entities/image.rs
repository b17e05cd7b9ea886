//! Image ownership
//!
//! Pictures are attached either to a project or to a recipe.

use serde::{Deserialize, Serialize};

/// Kind of entity an image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOwner {
    Project,
    Recipe,
}

impl ImageOwner {
    /// Sub-directory of the image root holding this owner's files
    pub fn directory(&self) -> &'static str {
        match self {
            ImageOwner::Project => "projects",
            ImageOwner::Recipe => "recipes",
        }
    }
}

impl std::fmt::Display for ImageOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageOwner::Project => write!(f, "project"),
            ImageOwner::Recipe => write!(f, "recipe"),
        }
    }
}

/// Image bytes together with the stored file name
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
