//! Image API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{GenerateImageRequest, GeneratedImage, User};
use crate::AppState;

/// Query parameters for image generation.
#[derive(Debug, Deserialize)]
pub struct GenerateImageQuery {
    /// When true, existing images for the quiz are discarded before the new
    /// one is generated.
    #[serde(default)]
    pub replace: bool,
}

/// GET /api/quiz/{id}/images/latest - Latest image for a quiz, if any.
pub async fn latest_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<Option<GeneratedImage>> {
    let quiz = state
        .repo
        .get_quiz_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    let image = state.repo.latest_image_by_quiz(quiz.id).await?;
    success(image)
}

/// POST /api/quiz/{id}/images/generate - Generate (or reuse) an image.
pub async fn generate_image(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Query(params): Query<GenerateImageQuery>,
    Json(request): Json<GenerateImageRequest>,
) -> ApiResult<GeneratedImage> {
    let quiz = state
        .repo
        .get_quiz_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    let image = state
        .imagegen
        .generate_for_quiz(&state.repo, &quiz, request.prompt.as_deref(), params.replace)
        .await?;

    success(image)
}
