//! Answer submission endpoint.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{AnswerResult, SubmitAnswerRequest, User};
use crate::AppState;

/// POST /api/quiz/{id}/answer - Submit an answer attempt.
///
/// Correctness is judged once, here, and frozen into the log record.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(request): Json<SubmitAnswerRequest>,
) -> ApiResult<AnswerResult> {
    let quiz = state
        .repo
        .get_quiz_owned(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    let (correct, log) = state
        .repo
        .log_answer(user.id, &quiz, &request.answer, request.image_shown)
        .await?;

    success(AnswerResult { correct, log })
}
