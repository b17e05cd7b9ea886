//! Media handlers
//!
//! Upload, download and removal of project and recipe pictures.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::domain::entities::{ProjectId, RecipeId, StoredImage, User};
use crate::error::AppError;
use crate::AppState;

/// Multipart field carrying the picture
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVersionResponse {
    pub image_version: i32,
}

/// Original file name and bytes of the `image` field
async fn read_image_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(AppError::BadRequest(format!(
        "Multipart field '{}' is missing",
        IMAGE_FIELD
    )))
}

/// Content type guessed from the file extension
fn content_type_of(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn image_response(image: StoredImage) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, content_type_of(&image.file_name))],
        image.bytes,
    )
}

/// POST /media/projects/:id/image
pub async fn upload_project_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ImageVersionResponse>, AppError> {
    let (file_name, bytes) = read_image_field(multipart).await?;

    let image_version = state
        .image_service
        .save_project_image(&user, &ProjectId(id), &file_name, &bytes)
        .await?;

    Ok(Json(ImageVersionResponse { image_version }))
}

/// GET /media/projects/:id/image
pub async fn get_project_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let image = state
        .image_service
        .get_project_image(&user, &ProjectId(id))
        .await?;
    Ok(image_response(image))
}

/// DELETE /media/projects/:id/image
pub async fn delete_project_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .image_service
        .delete_project_image(&user, &ProjectId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /media/recipes/:id/image
pub async fn upload_recipe_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ImageVersionResponse>, AppError> {
    let (file_name, bytes) = read_image_field(multipart).await?;

    let image_version = state
        .image_service
        .save_recipe_image(&RecipeId(id), &file_name, &bytes)
        .await?;

    Ok(Json(ImageVersionResponse { image_version }))
}

/// GET /media/recipes/:id/image
pub async fn get_recipe_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let image = state.image_service.get_recipe_image(&RecipeId(id)).await?;
    Ok(image_response(image))
}

/// DELETE /media/recipes/:id/image
pub async fn delete_recipe_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.image_service.delete_recipe_image(&RecipeId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
