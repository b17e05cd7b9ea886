//! Image service
//!
//! Pictures of projects and recipes. The file is written first, then the
//! owner's row is pointed at it and the previous file is removed.

use std::sync::Arc;

use super::project_service::ensure_participant;
use crate::domain::entities::{ImageOwner, ProjectId, RecipeId, StoredImage, User};
use crate::domain::ports::{ImageStore, ProjectRepository, RecipeRepository};
use crate::error::{AppError, DomainError, StorageError};

/// Service for project and recipe pictures
pub struct ImageService<PR, RR, IS>
where
    PR: ProjectRepository,
    RR: RecipeRepository,
    IS: ImageStore,
{
    projects: Arc<PR>,
    recipes: Arc<RR>,
    images: Arc<IS>,
    max_image_bytes: usize,
}

impl<PR, RR, IS> ImageService<PR, RR, IS>
where
    PR: ProjectRepository,
    RR: RecipeRepository,
    IS: ImageStore,
{
    pub fn new(
        projects: Arc<PR>,
        recipes: Arc<RR>,
        images: Arc<IS>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            projects,
            recipes,
            images,
            max_image_bytes,
        }
    }

    // Project images

    /// Store a new project picture, returning the new image version
    pub async fn save_project_image(
        &self,
        user: &User,
        id: &ProjectId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<i32, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;
        self.check_upload(bytes)?;

        let previous = self.projects.get_image_uri(id).await?;
        let stored = self.images.save(ImageOwner::Project, file_name, bytes).await?;

        let version = match self.projects.set_image(id, Some(&stored)).await {
            Ok(version) => version,
            Err(e) => {
                self.discard(ImageOwner::Project, &stored).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous {
            self.discard(ImageOwner::Project, &previous).await;
        }

        tracing::debug!("Project {} has image version {}", id, version);
        Ok(version)
    }

    pub async fn get_project_image(
        &self,
        user: &User,
        id: &ProjectId,
    ) -> Result<StoredImage, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;

        let file_name = self
            .projects
            .get_image_uri(id)
            .await?
            .ok_or_else(|| no_image(ImageOwner::Project, id))?;
        let bytes = self.images.load(ImageOwner::Project, &file_name).await?;

        Ok(StoredImage { file_name, bytes })
    }

    /// Remove the project picture; this also bumps the image version.
    ///
    /// A missing file fails with `NotFound` and leaves the project unchanged.
    pub async fn delete_project_image(&self, user: &User, id: &ProjectId) -> Result<(), AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;

        let file_name = self
            .projects
            .get_image_uri(id)
            .await?
            .ok_or_else(|| no_image(ImageOwner::Project, id))?;
        self.ensure_stored(ImageOwner::Project, &file_name).await?;

        self.projects.set_image(id, None).await?;
        self.discard(ImageOwner::Project, &file_name).await;
        Ok(())
    }

    // Recipe images

    /// Store a new recipe picture, returning the new image version
    pub async fn save_recipe_image(
        &self,
        id: &RecipeId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<i32, AppError> {
        self.check_upload(bytes)?;

        let previous = self.recipes.get_image_uri(id).await?;
        let stored = self.images.save(ImageOwner::Recipe, file_name, bytes).await?;

        let version = match self.recipes.set_image(id, Some(&stored)).await {
            Ok(version) => version,
            Err(e) => {
                self.discard(ImageOwner::Recipe, &stored).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous {
            self.discard(ImageOwner::Recipe, &previous).await;
        }

        tracing::debug!("Recipe {} has image version {}", id, version);
        Ok(version)
    }

    pub async fn get_recipe_image(&self, id: &RecipeId) -> Result<StoredImage, AppError> {
        let file_name = self
            .recipes
            .get_image_uri(id)
            .await?
            .ok_or_else(|| no_image(ImageOwner::Recipe, id))?;
        let bytes = self.images.load(ImageOwner::Recipe, &file_name).await?;

        Ok(StoredImage { file_name, bytes })
    }

    pub async fn delete_recipe_image(&self, id: &RecipeId) -> Result<(), AppError> {
        let file_name = self
            .recipes
            .get_image_uri(id)
            .await?
            .ok_or_else(|| no_image(ImageOwner::Recipe, id))?;
        self.ensure_stored(ImageOwner::Recipe, &file_name).await?;

        self.recipes.set_image(id, None).await?;
        self.discard(ImageOwner::Recipe, &file_name).await;
        Ok(())
    }

    fn check_upload(&self, bytes: &[u8]) -> Result<(), AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Image must not be empty".to_string()));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(AppError::BadRequest(format!(
                "Image is larger than {} bytes",
                self.max_image_bytes
            )));
        }
        Ok(())
    }

    async fn ensure_stored(&self, owner: ImageOwner, file_name: &str) -> Result<(), AppError> {
        if self.images.exists(owner, file_name).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound {
                owner,
                name: file_name.to_string(),
            }
            .into())
        }
    }

    /// Best-effort removal of a file that is no longer referenced
    async fn discard(&self, owner: ImageOwner, file_name: &str) {
        if let Err(e) = self.images.delete(owner, file_name).await {
            tracing::warn!("Failed to delete {} image {}: {}", owner, file_name, e);
        }
    }
}

fn no_image(owner: ImageOwner, id: impl std::fmt::Display) -> DomainError {
    DomainError::NotFound(format!("The {} {} has no image", owner, id))
}
