//! Project handlers
//!
//! Endpoints for project plans and project membership.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::Links;
use crate::domain::entities::{Project, ProjectContent, ProjectId, ProjectStub, User, VersionNumbers};
use crate::error::AppError;
use crate::AppState;

/// A project with its full plan
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i32,
    pub project_version: i32,
    pub image_version: i32,
    pub image_uri: Option<String>,
    #[serde(flatten)]
    pub content: ProjectContent,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id.0,
            project_version: project.project_version,
            image_version: project.image_version,
            image_uri: project.image_uri,
            content: project.content,
        }
    }
}

/// Entry of the project overview
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStubResponse {
    pub id: i32,
    pub name: String,
    pub image_uri: Option<String>,
    pub project_version: i32,
    pub image_version: i32,
    pub links: Links,
}

impl ProjectStubResponse {
    fn new(stub: ProjectStub, base_url: &str) -> Self {
        Self {
            links: Links::new(base_url, "projects", stub.id.0),
            id: stub.id.0,
            name: stub.name,
            image_uri: stub.image_uri,
            project_version: stub.project_version,
            image_version: stub.image_version,
        }
    }
}

/// Request to replace a project plan
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    /// Must match the path id when present
    #[serde(default)]
    pub id: Option<i32>,
    /// Data version the client's edits are based on
    pub project_version: i32,
    #[serde(flatten)]
    pub content: ProjectContent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectResponse {
    pub project_version: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub invitation_link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinProjectRequest {
    pub invitation_link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinProjectResponse {
    pub project_id: i32,
}

/// POST /projects
///
/// Create a project with the caller as first participant.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(content): Json<ProjectContent>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.project_service.create_project(&user, &content).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/projects/{}", id))],
        Json(id.0),
    ))
}

/// GET /projects
///
/// Projects the caller participates in.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ProjectStubResponse>>, AppError> {
    let stubs = state.project_service.list_project_stubs(&user).await?;

    Ok(Json(
        stubs
            .into_iter()
            .map(|stub| ProjectStubResponse::new(stub, &state.config.api_base_url))
            .collect(),
    ))
}

/// GET /projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state
        .project_service
        .get_project(&user, &ProjectId(id))
        .await?;
    Ok(Json(project.into()))
}

/// PUT /projects/:id
///
/// Replace the plan. Fails with 409 when somebody else saved first.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<UpdateProjectResponse>, AppError> {
    if request.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::BadRequest(format!(
            "Body id does not match project {}",
            id
        )));
    }

    let project_version = state
        .project_service
        .update_project(
            &user,
            &ProjectId(id),
            request.project_version,
            &request.content,
        )
        .await?;

    Ok(Json(UpdateProjectResponse { project_version }))
}

/// GET /projects/:id/version
pub async fn get_project_version(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<VersionNumbers>, AppError> {
    let versions = state
        .organisation_service
        .get_current_project_version(&user, &ProjectId(id))
        .await?;
    Ok(Json(versions))
}

/// GET /projects/:id/invitation
pub async fn get_invitation_link(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation_link = state
        .organisation_service
        .get_invitation_link(&user, &ProjectId(id))
        .await?;
    Ok(Json(InvitationResponse { invitation_link }))
}

/// POST /projects/join
///
/// Join with an invitation link (or a bare token) in the body.
pub async fn join_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<JoinProjectRequest>,
) -> Result<Json<JoinProjectResponse>, AppError> {
    let id = state
        .organisation_service
        .join_project(&user, &request.invitation_link)
        .await?;
    Ok(Json(JoinProjectResponse { project_id: id.0 }))
}

/// POST /projects/join/:token
///
/// Join by following the invitation link itself.
pub async fn join_project_by_token(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(token): Path<String>,
) -> Result<Json<JoinProjectResponse>, AppError> {
    let id = state
        .organisation_service
        .join_project(&user, &token)
        .await?;
    Ok(Json(JoinProjectResponse { project_id: id.0 }))
}

/// POST /projects/:id/leave
///
/// Leave a project; the last participant leaving deletes it.
pub async fn leave_project(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .organisation_service
        .leave_project(&user, &ProjectId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
