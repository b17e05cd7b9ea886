//! Project service
//!
//! Creating, reading and editing the meal plan of a project. Every operation
//! is restricted to the project's participants.

use std::sync::Arc;

use crate::domain::entities::{Project, ProjectContent, ProjectId, ProjectStub, User, VersionNumbers};
use crate::domain::ports::{ProjectRepository, RecipeRepository};
use crate::error::{AppError, DomainError};

/// Fail unless `user` participates in the project.
///
/// Unknown projects yield `NotFound`, known projects of other users `Forbidden`.
pub async fn ensure_participant<PR>(
    projects: &PR,
    project_id: &ProjectId,
    user: &User,
) -> Result<(), AppError>
where
    PR: ProjectRepository + ?Sized,
{
    if projects.is_participant(project_id, &user.id).await? {
        return Ok(());
    }

    if projects.get_versions(project_id).await?.is_none() {
        return Err(DomainError::NotFound(format!("Project {} not found", project_id)).into());
    }

    Err(DomainError::Forbidden(format!(
        "User {} does not participate in project {}",
        user.name, project_id
    ))
    .into())
}

/// Service for project plans
pub struct ProjectService<PR, RR>
where
    PR: ProjectRepository,
    RR: RecipeRepository,
{
    projects: Arc<PR>,
    recipes: Arc<RR>,
}

impl<PR, RR> ProjectService<PR, RR>
where
    PR: ProjectRepository,
    RR: RecipeRepository,
{
    pub fn new(projects: Arc<PR>, recipes: Arc<RR>) -> Self {
        Self { projects, recipes }
    }

    /// Create a project with `user` as its first participant
    pub async fn create_project(
        &self,
        user: &User,
        content: &ProjectContent,
    ) -> Result<ProjectId, AppError> {
        self.validate(content).await?;

        let id = self.projects.create(content, &user.id).await?;

        tracing::info!("User {} created project {} ({})", user.name, content.name, id);
        Ok(id)
    }

    /// Get the full plan of a project
    pub async fn get_project(&self, user: &User, id: &ProjectId) -> Result<Project, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;

        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id)).into())
    }

    /// Replace the plan of a project if nobody changed it since `expected_version`.
    ///
    /// Returns the new data version.
    pub async fn update_project(
        &self,
        user: &User,
        id: &ProjectId,
        expected_version: i32,
        content: &ProjectContent,
    ) -> Result<i32, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;
        self.validate(content).await?;

        let version = self
            .projects
            .replace_content(id, expected_version, content)
            .await?;

        tracing::debug!("Project {} updated to version {}", id, version);
        Ok(version)
    }

    /// Stubs of all projects the user participates in
    pub async fn list_project_stubs(&self, user: &User) -> Result<Vec<ProjectStub>, AppError> {
        Ok(self.projects.find_stubs_by_participant(&user.id).await?)
    }

    pub async fn get_versions(
        &self,
        user: &User,
        id: &ProjectId,
    ) -> Result<VersionNumbers, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;

        self.projects
            .get_versions(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id)).into())
    }

    /// Check the plan itself and that every scheduled recipe exists
    async fn validate(&self, content: &ProjectContent) -> Result<(), AppError> {
        content.validate()?;

        for recipe_id in content.referenced_recipes() {
            if !self.recipes.exists(&recipe_id).await? {
                return Err(DomainError::Validation(format!(
                    "Recipe {} does not exist",
                    recipe_id
                ))
                .into());
            }
        }

        Ok(())
    }
}
