//! Project organisation service
//!
//! Invitations, joining and leaving projects and the version poll used by
//! clients to notice changes made by other participants.

use std::sync::Arc;

use rand::Rng;

use super::project_service::ensure_participant;
use crate::domain::entities::{ImageOwner, LeaveOutcome, ProjectId, User, VersionNumbers};
use crate::domain::ports::{ImageStore, ProjectRepository};
use crate::error::{AppError, DomainError};

/// Service for project membership
pub struct ProjectOrganisationService<PR, IS>
where
    PR: ProjectRepository,
    IS: ImageStore,
{
    projects: Arc<PR>,
    images: Arc<IS>,
    api_base_url: String,
}

impl<PR, IS> ProjectOrganisationService<PR, IS>
where
    PR: ProjectRepository,
    IS: ImageStore,
{
    pub fn new(projects: Arc<PR>, images: Arc<IS>, api_base_url: String) -> Self {
        Self {
            projects,
            images,
            api_base_url,
        }
    }

    /// Invitation link of a project; the token behind it is created on first use
    pub async fn get_invitation_link(
        &self,
        user: &User,
        id: &ProjectId,
    ) -> Result<String, AppError> {
        ensure_participant(self.projects.as_ref(), id, user).await?;

        let token = match self.projects.get_invitation_token(id).await? {
            Some(token) => token,
            None => {
                self.projects
                    .set_invitation_token(id, &generate_invitation_token())
                    .await?;
                // Re-read in case another participant created one at the same time
                self.projects
                    .get_invitation_token(id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!("Invitation token of project {} was not stored", id))
                    })?
            }
        };

        Ok(format!(
            "{}/projects/join/{}",
            self.api_base_url.trim_end_matches('/'),
            token
        ))
    }

    /// Join the project behind an invitation link or bare token.
    ///
    /// Joining a project twice is a no-op.
    pub async fn join_project(
        &self,
        user: &User,
        invitation_link: &str,
    ) -> Result<ProjectId, AppError> {
        let token = invitation_token_of(invitation_link)
            .ok_or_else(|| AppError::BadRequest("Invitation link is empty".to_string()))?;

        let id = self
            .projects
            .find_by_invitation_token(token)
            .await?
            .ok_or_else(|| DomainError::NotFound("Invitation link is not valid".to_string()))?;

        if !self.projects.is_participant(&id, &user.id).await? {
            self.projects.add_participant(&id, &user.id).await?;
            tracing::info!("User {} joined project {}", user.name, id);
        }

        Ok(id)
    }

    /// Leave a project; the last participant leaving deletes it
    pub async fn leave_project(&self, user: &User, id: &ProjectId) -> Result<(), AppError> {
        match self.projects.leave(id, &user.id).await? {
            LeaveOutcome::NotParticipant => Err(DomainError::NotFound(format!(
                "User {} does not participate in project {}",
                user.name, id
            ))
            .into()),
            LeaveOutcome::Left => {
                tracing::info!("User {} left project {}", user.name, id);
                Ok(())
            }
            LeaveOutcome::Deleted { image_uri } => {
                tracing::info!("Deleted project {} after its last participant {} left", id, user.name);

                if let Some(file_name) = image_uri {
                    if let Err(e) = self.images.delete(ImageOwner::Project, &file_name).await {
                        tracing::warn!("Failed to delete image {} of project {}: {}", file_name, id, e);
                    }
                }
                Ok(())
            }
        }
    }

    pub async fn get_current_project_version(
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
}

/// Generate a random invitation token (URL safe)
fn generate_invitation_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..24).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// The token of an invitation link is its last path segment
fn invitation_token_of(link: &str) -> Option<&str> {
    let link = link.trim();
    let link = link.split(['?', '#']).next().unwrap_or(link);
    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|token| !token.is_empty())
}
