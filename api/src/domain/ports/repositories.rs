//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., the SeaORM database adapter).

use async_trait::async_trait;

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    LeaveOutcome, NewUser, Project, ProjectContent, ProjectId, ProjectStub, Recipe, RecipeContent,
    RecipeId, RecipeStub, Session, User, UserId, VersionNumbers,
};
use crate::error::DomainError;

/// Repository for registered users and their credentials
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user together with the password hash.
    /// Fails with `AlreadyExists` when the name is taken.
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by their unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError>;

    /// Get the stored password hash of a user
    async fn get_password_hash(&self, id: &UserId) -> Result<Option<String>, DomainError>;
}

/// Repository for login sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session
    async fn create(&self, session: &Session) -> Result<(), DomainError>;

    /// Find a session by the hash of its token
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError>;

    /// Delete a session; deleting an unknown session is not an error
    async fn delete(&self, token_hash: &str) -> Result<(), DomainError>;

    /// Delete all sessions that expired before `now`, returning how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}

/// Repository for projects, their nested plan and their participants
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persist a new project with `owner` as its first participant
    async fn create(&self, content: &ProjectContent, owner: &UserId)
        -> Result<ProjectId, DomainError>;

    /// Load a project with its full plan
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DomainError>;

    /// Replace the whole plan if the stored data version equals `expected_version`.
    ///
    /// Returns the new data version. Fails with `NotFound` for unknown projects
    /// and `Conflict` when the version does not match.
    async fn replace_content(
        &self,
        id: &ProjectId,
        expected_version: i32,
        content: &ProjectContent,
    ) -> Result<i32, DomainError>;

    /// Delete a project with everything that belongs to it
    async fn delete(&self, id: &ProjectId) -> Result<(), DomainError>;

    /// Stubs of all projects a user participates in, ordered by ID
    async fn find_stubs_by_participant(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProjectStub>, DomainError>;

    /// Current data and image versions
    async fn get_versions(&self, id: &ProjectId) -> Result<Option<VersionNumbers>, DomainError>;

    // Participants

    /// Whether a user participates in a project
    async fn is_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<bool, DomainError>;

    /// Add a participant; adding an existing participant is a no-op
    async fn add_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<(), DomainError>;

    /// Remove a participant and delete the project if nobody is left.
    ///
    /// Runs atomically with respect to `add_participant`, so nobody can join
    /// a project that is being deleted.
    async fn leave(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<LeaveOutcome, DomainError>;

    /// Number of participants of a project
    async fn count_participants(&self, project_id: &ProjectId) -> Result<u64, DomainError>;

    // Invitations

    /// Invitation token of a project, `NotFound` for unknown projects
    async fn get_invitation_token(&self, id: &ProjectId) -> Result<Option<String>, DomainError>;

    /// Store the invitation token of a project unless it already has one
    async fn set_invitation_token(&self, id: &ProjectId, token: &str) -> Result<(), DomainError>;

    /// Find the project an invitation token belongs to
    async fn find_by_invitation_token(&self, token: &str)
        -> Result<Option<ProjectId>, DomainError>;

    // Image

    /// File name of the project picture, `NotFound` for unknown projects
    async fn get_image_uri(&self, id: &ProjectId) -> Result<Option<String>, DomainError>;

    /// Set or clear the picture and bump the image version, returning the new version
    async fn set_image(&self, id: &ProjectId, image_uri: Option<&str>) -> Result<i32, DomainError>;
}

/// Repository for the shared recipe catalogue
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Persist a new recipe
    async fn create(&self, content: &RecipeContent) -> Result<RecipeId, DomainError>;

    /// Load a recipe with ingredients, instructions and dietary specialities
    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, DomainError>;

    /// Whether a recipe exists
    async fn exists(&self, id: &RecipeId) -> Result<bool, DomainError>;

    /// Replace the recipe if its version equals `expected_version`, returning the new version
    async fn replace_content(
        &self,
        id: &RecipeId,
        expected_version: i32,
        content: &RecipeContent,
    ) -> Result<i32, DomainError>;

    /// Stubs of all recipes, ordered by name
    async fn find_stubs(&self) -> Result<Vec<RecipeStub>, DomainError>;

    /// Current data and image versions
    async fn get_versions(&self, id: &RecipeId) -> Result<Option<VersionNumbers>, DomainError>;

    /// File name of the recipe picture, `NotFound` for unknown recipes
    async fn get_image_uri(&self, id: &RecipeId) -> Result<Option<String>, DomainError>;

    /// Set or clear the picture and bump the image version, returning the new version
    async fn set_image(&self, id: &RecipeId, image_uri: Option<&str>) -> Result<i32, DomainError>;
}
