//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::adapters::filesystem::image_store::sanitize_file_name;
use crate::domain::entities::{
    ImageOwner, LeaveOutcome, NewUser, Project, ProjectContent, ProjectId, ProjectStub, Recipe,
    RecipeContent, RecipeId, RecipeStub, Session, User, UserId, VersionNumbers,
};
use crate::domain::ports::{
    ImageStore, ProjectRepository, RecipeRepository, SessionRepository, UserRepository,
};
use crate::error::{DomainError, StorageError};

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    password_hashes: Arc<RwLock<HashMap<UserId, String>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user and their password hash
    pub fn with_user(self, user: User, password_hash: &str) -> Self {
        self.password_hashes
            .write()
            .unwrap()
            .insert(user.id, password_hash.to_string());
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.name == new_user.name) {
            return Err(DomainError::AlreadyExists(format!(
                "User '{}'",
                new_user.name
            )));
        }

        let id = UserId(users.keys().map(|id| id.0).max().unwrap_or(0) + 1);
        let user = User {
            id,
            name: new_user.name.clone(),
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        self.password_hashes
            .write()
            .unwrap()
            .insert(id, new_user.password_hash.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn get_password_hash(&self, id: &UserId) -> Result<Option<String>, DomainError> {
        Ok(self.password_hashes.read().unwrap().get(id).cloned())
    }
}

// ============================================================================
// In-Memory Session Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a session
    pub fn with_session(self, session: Session) -> Self {
        self.sessions
            .write()
            .unwrap()
            .insert(session.token_hash.clone(), session);
        self
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Token hashes of all stored sessions
    pub fn token_hashes(&self) -> Vec<String> {
        self.sessions.read().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), DomainError> {
        self.sessions
            .write()
            .unwrap()
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().unwrap().get(token_hash).cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<(), DomainError> {
        self.sessions.write().unwrap().remove(token_hash);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

// ============================================================================
// In-Memory Project Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
    participants: Arc<RwLock<HashMap<ProjectId, BTreeSet<UserId>>>>,
    invitation_tokens: Arc<RwLock<HashMap<ProjectId, String>>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a project and its participants
    pub fn with_project(self, project: Project, participants: &[UserId]) -> Self {
        self.participants
            .write()
            .unwrap()
            .insert(project.id, participants.iter().copied().collect());
        self.projects.write().unwrap().insert(project.id, project);
        self
    }

    /// Pre-populate the invitation token of a project
    pub fn with_invitation_token(self, id: ProjectId, token: &str) -> Self {
        self.invitation_tokens
            .write()
            .unwrap()
            .insert(id, token.to_string());
        self
    }

    fn not_found(id: &ProjectId) -> DomainError {
        DomainError::NotFound(format!("Project {}", id))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(
        &self,
        content: &ProjectContent,
        owner: &UserId,
    ) -> Result<ProjectId, DomainError> {
        let mut projects = self.projects.write().unwrap();
        let id = ProjectId(projects.keys().map(|id| id.0).max().unwrap_or(0) + 1);
        projects.insert(
            id,
            Project {
                id,
                project_version: 0,
                image_version: 0,
                image_uri: None,
                content: content.clone(),
            },
        );
        self.participants
            .write()
            .unwrap()
            .insert(id, BTreeSet::from([*owner]));
        Ok(id)
    }

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DomainError> {
        Ok(self.projects.read().unwrap().get(id).cloned())
    }

    async fn replace_content(
        &self,
        id: &ProjectId,
        expected_version: i32,
        content: &ProjectContent,
    ) -> Result<i32, DomainError> {
        let mut projects = self.projects.write().unwrap();
        let project = projects.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if project.project_version != expected_version {
            return Err(DomainError::Conflict(format!(
                "Project {} is at version {}",
                id, project.project_version
            )));
        }
        project.project_version += 1;
        project.content = content.clone();
        Ok(project.project_version)
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), DomainError> {
        self.participants.write().unwrap().remove(id);
        self.invitation_tokens.write().unwrap().remove(id);
        self.projects
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn find_stubs_by_participant(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProjectStub>, DomainError> {
        let participants = self.participants.read().unwrap();
        let projects = self.projects.read().unwrap();

        let mut stubs: Vec<ProjectStub> = projects
            .values()
            .filter(|p| {
                participants
                    .get(&p.id)
                    .is_some_and(|users| users.contains(user_id))
            })
            .map(|p| ProjectStub {
                id: p.id,
                name: p.content.name.clone(),
                image_uri: p.image_uri.clone(),
                project_version: p.project_version,
                image_version: p.image_version,
            })
            .collect();
        stubs.sort_by_key(|s| s.id);
        Ok(stubs)
    }

    async fn get_versions(&self, id: &ProjectId) -> Result<Option<VersionNumbers>, DomainError> {
        Ok(self
            .projects
            .read()
            .unwrap()
            .get(id)
            .map(|p| VersionNumbers {
                data_version: p.project_version,
                image_version: p.image_version,
            }))
    }

    async fn is_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .participants
            .read()
            .unwrap()
            .get(project_id)
            .is_some_and(|users| users.contains(user_id)))
    }

    async fn add_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        if !self.projects.read().unwrap().contains_key(project_id) {
            return Err(Self::not_found(project_id));
        }
        self.participants
            .write()
            .unwrap()
            .entry(*project_id)
            .or_default()
            .insert(*user_id);
        Ok(())
    }

    async fn leave(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<LeaveOutcome, DomainError> {
        let mut projects = self.projects.write().unwrap();
        let mut participants = self.participants.write().unwrap();

        let Some(users) = participants.get_mut(project_id) else {
            return Ok(LeaveOutcome::NotParticipant);
        };
        if !users.remove(user_id) {
            return Ok(LeaveOutcome::NotParticipant);
        }
        if !users.is_empty() {
            return Ok(LeaveOutcome::Left);
        }

        participants.remove(project_id);
        self.invitation_tokens.write().unwrap().remove(project_id);
        let image_uri = projects.remove(project_id).and_then(|p| p.image_uri);
        Ok(LeaveOutcome::Deleted { image_uri })
    }

    async fn count_participants(&self, project_id: &ProjectId) -> Result<u64, DomainError> {
        Ok(self
            .participants
            .read()
            .unwrap()
            .get(project_id)
            .map_or(0, |users| users.len() as u64))
    }

    async fn get_invitation_token(&self, id: &ProjectId) -> Result<Option<String>, DomainError> {
        if !self.projects.read().unwrap().contains_key(id) {
            return Err(Self::not_found(id));
        }
        Ok(self.invitation_tokens.read().unwrap().get(id).cloned())
    }

    async fn set_invitation_token(&self, id: &ProjectId, token: &str) -> Result<(), DomainError> {
        if !self.projects.read().unwrap().contains_key(id) {
            return Err(Self::not_found(id));
        }
        self.invitation_tokens
            .write()
            .unwrap()
            .entry(*id)
            .or_insert_with(|| token.to_string());
        Ok(())
    }

    async fn find_by_invitation_token(
        &self,
        token: &str,
    ) -> Result<Option<ProjectId>, DomainError> {
        Ok(self
            .invitation_tokens
            .read()
            .unwrap()
            .iter()
            .find(|(_, t)| t.as_str() == token)
            .map(|(id, _)| *id))
    }

    async fn get_image_uri(&self, id: &ProjectId) -> Result<Option<String>, DomainError> {
        self.projects
            .read()
            .unwrap()
            .get(id)
            .map(|p| p.image_uri.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn set_image(&self, id: &ProjectId, image_uri: Option<&str>) -> Result<i32, DomainError> {
        let mut projects = self.projects.write().unwrap();
        let project = projects.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        project.image_uri = image_uri.map(str::to_string);
        project.image_version += 1;
        Ok(project.image_version)
    }
}

// ============================================================================
// In-Memory Recipe Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryRecipeRepository {
    recipes: Arc<RwLock<HashMap<RecipeId, Recipe>>>,
    should_fail: AtomicBool,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose inserts fail until `recover` is called
    pub fn failing() -> Self {
        Self {
            should_fail: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn recover(&self) {
        self.should_fail.store(false, Ordering::SeqCst);
    }

    /// Pre-populate with a recipe
    pub fn with_recipe(self, recipe: Recipe) -> Self {
        self.recipes.write().unwrap().insert(recipe.id, recipe);
        self
    }

    fn not_found(id: &RecipeId) -> DomainError {
        DomainError::NotFound(format!("Recipe {}", id))
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn create(&self, content: &RecipeContent) -> Result<RecipeId, DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("database is locked".to_string()));
        }
        let mut recipes = self.recipes.write().unwrap();
        let id = RecipeId(recipes.keys().map(|id| id.0).max().unwrap_or(0) + 1);
        recipes.insert(
            id,
            Recipe {
                id,
                version: 0,
                image_version: 0,
                image_uri: None,
                content: content.clone(),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, DomainError> {
        Ok(self.recipes.read().unwrap().get(id).cloned())
    }

    async fn exists(&self, id: &RecipeId) -> Result<bool, DomainError> {
        Ok(self.recipes.read().unwrap().contains_key(id))
    }

    async fn replace_content(
        &self,
        id: &RecipeId,
        expected_version: i32,
        content: &RecipeContent,
    ) -> Result<i32, DomainError> {
        let mut recipes = self.recipes.write().unwrap();
        let recipe = recipes.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if recipe.version != expected_version {
            return Err(DomainError::Conflict(format!(
                "Recipe {} is at version {}",
                id, recipe.version
            )));
        }
        recipe.version += 1;
        recipe.content = content.clone();
        Ok(recipe.version)
    }

    async fn find_stubs(&self) -> Result<Vec<RecipeStub>, DomainError> {
        let mut stubs: Vec<RecipeStub> = self
            .recipes
            .read()
            .unwrap()
            .values()
            .map(|r| RecipeStub {
                id: r.id,
                name: r.content.name.clone(),
                description: r.content.description.clone(),
                number_of_people: r.content.number_of_people,
                version: r.version,
                image_version: r.image_version,
            })
            .collect();
        stubs.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(stubs)
    }

    async fn get_versions(&self, id: &RecipeId) -> Result<Option<VersionNumbers>, DomainError> {
        Ok(self
            .recipes
            .read()
            .unwrap()
            .get(id)
            .map(|r| VersionNumbers {
                data_version: r.version,
                image_version: r.image_version,
            }))
    }

    async fn get_image_uri(&self, id: &RecipeId) -> Result<Option<String>, DomainError> {
        self.recipes
            .read()
            .unwrap()
            .get(id)
            .map(|r| r.image_uri.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn set_image(&self, id: &RecipeId, image_uri: Option<&str>) -> Result<i32, DomainError> {
        let mut recipes = self.recipes.write().unwrap();
        let recipe = recipes.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        recipe.image_uri = image_uri.map(str::to_string);
        recipe.image_version += 1;
        Ok(recipe.image_version)
    }
}

// ============================================================================
// In-Memory Image Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryImageStore {
    files: Arc<RwLock<HashMap<(ImageOwner, String), Vec<u8>>>>,
    should_fail: bool,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose writes fail with an I/O error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Pre-populate with a stored file
    pub fn with_file(self, owner: ImageOwner, file_name: &str, bytes: &[u8]) -> Self {
        self.files
            .write()
            .unwrap()
            .insert((owner, file_name.to_string()), bytes.to_vec());
        self
    }

    /// Whether a file is stored
    pub fn contains(&self, owner: ImageOwner, file_name: &str) -> bool {
        self.files
            .read()
            .unwrap()
            .contains_key(&(owner, file_name.to_string()))
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(
        &self,
        owner: ImageOwner,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        let file_name = format!(
            "{}_{}",
            uuid::Uuid::new_v4(),
            sanitize_file_name(original_name)
        );
        self.files
            .write()
            .unwrap()
            .insert((owner, file_name.clone()), bytes.to_vec());
        Ok(file_name)
    }

    async fn load(&self, owner: ImageOwner, file_name: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .read()
            .unwrap()
            .get(&(owner, file_name.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                owner,
                name: file_name.to_string(),
            })
    }

    async fn exists(&self, owner: ImageOwner, file_name: &str) -> Result<bool, StorageError> {
        Ok(self.contains(owner, file_name))
    }

    async fn delete(&self, owner: ImageOwner, file_name: &str) -> Result<(), StorageError> {
        self.files
            .write()
            .unwrap()
            .remove(&(owner, file_name.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                owner,
                name: file_name.to_string(),
            })
    }
}
