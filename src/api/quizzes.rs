//! Quiz API endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateQuizRequest, Quiz, QuizWithStatus, SortOrder, StatusFilter, User};
use crate::AppState;

/// Query parameters for quiz listings.
#[derive(Debug, Deserialize)]
pub struct ListQuizzesQuery {
    /// Case-insensitive substring filter on question or answer.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub status: StatusFilter,
}

fn default_limit() -> i64 {
    100
}

/// POST /api/quiz - Create a new quiz.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateQuizRequest>,
) -> ApiResult<Quiz> {
    // Validate required fields
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("Question is required".to_string()));
    }
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("Answer is required".to_string()));
    }

    let quiz = state
        .repo
        .create_quiz(user.id, &request.question, &request.answer)
        .await?;

    success(quiz)
}

/// GET /api/quiz - List the caller's quizzes with attempt status.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ListQuizzesQuery>,
) -> ApiResult<Vec<QuizWithStatus>> {
    let quizzes = state
        .repo
        .list_quizzes_with_status(
            user.id,
            params.q.as_deref(),
            params.order,
            params.offset,
            params.limit,
            params.status,
        )
        .await?;

    success(quizzes)
}

/// DELETE /api/quiz/{id} - Delete a quiz and everything hanging off it.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    match state.repo.delete_quiz_owned(id, user.id).await? {
        Some(file_paths) => {
            // Records are gone; backing files go after the transaction,
            // best-effort.
            state.imagegen.remove_files(&file_paths).await;
            success(())
        }
        None => Err(AppError::NotFound(format!("Quiz {} not found", id))),
    }
}
