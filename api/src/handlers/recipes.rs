//! Recipe handlers
//!
//! Endpoints for the shared recipe catalogue.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::Links;
use crate::domain::entities::{Recipe, RecipeContent, RecipeId, RecipeStub, VersionNumbers};
use crate::error::AppError;
use crate::AppState;

/// A recipe with ingredients and instructions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: i32,
    pub version: i32,
    pub image_version: i32,
    pub image_uri: Option<String>,
    #[serde(flatten)]
    pub content: RecipeContent,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.0,
            version: recipe.version,
            image_version: recipe.image_version,
            image_uri: recipe.image_uri,
            content: recipe.content,
        }
    }
}

/// Entry of the recipe catalogue
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStubResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub number_of_people: i32,
    pub version: i32,
    pub image_version: i32,
    pub links: Links,
}

impl RecipeStubResponse {
    fn new(stub: RecipeStub, base_url: &str) -> Self {
        Self {
            links: Links::new(base_url, "recipes", stub.id.0),
            id: stub.id.0,
            name: stub.name,
            description: stub.description,
            number_of_people: stub.number_of_people,
            version: stub.version,
            image_version: stub.image_version,
        }
    }
}

/// Request to replace a recipe
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub version: i32,
    #[serde(flatten)]
    pub content: RecipeContent,
}

#[derive(Debug, Serialize)]
pub struct UpdateRecipeResponse {
    pub version: i32,
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(content): Json<RecipeContent>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.recipe_service.create_recipe(&content).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/recipes/{}", id))],
        Json(id.0),
    ))
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeStubResponse>>, AppError> {
    let stubs = state.recipe_service.list_recipe_stubs().await?;

    Ok(Json(
        stubs
            .into_iter()
            .map(|stub| RecipeStubResponse::new(stub, &state.config.api_base_url))
            .collect(),
    ))
}

/// GET /recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.recipe_service.get_recipe(&RecipeId(id)).await?;
    Ok(Json(recipe.into()))
}

/// PUT /recipes/:id
///
/// Replace a recipe. Fails with 409 when somebody else saved first.
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRecipeRequest>,
) -> Result<Json<UpdateRecipeResponse>, AppError> {
    if request.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::BadRequest(format!(
            "Body id does not match recipe {}",
            id
        )));
    }

    let version = state
        .recipe_service
        .update_recipe(&RecipeId(id), request.version, &request.content)
        .await?;

    Ok(Json(UpdateRecipeResponse { version }))
}

/// GET /recipes/:id/version
pub async fn get_recipe_version(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VersionNumbers>, AppError> {
    let versions = state.recipe_service.get_versions(&RecipeId(id)).await?;
    Ok(Json(versions))
}
