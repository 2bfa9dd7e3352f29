//! Answer log model. Append-only; rows are never updated.

use serde::{Deserialize, Serialize};

/// An immutable record of one answer attempt.
///
/// The correctness verdict is computed once at insert time and frozen;
/// editing a quiz's answer later does not re-score past attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerLog {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub is_correct: bool,
    pub user_answer: String,
    /// Whether an image was visible when the answer was submitted.
    pub image_shown: bool,
    pub answered_at: String,
}

/// Request body for submitting an answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub answer: String,
    #[serde(default)]
    pub image_shown: bool,
}

/// Verdict plus the stored log entry, returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub correct: bool,
    pub log: AnswerLog,
}
