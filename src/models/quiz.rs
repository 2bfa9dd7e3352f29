//! Quiz model and list query types.

use serde::{Deserialize, Serialize};

/// A question/answer pair owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub user_id: i64,
    pub created_at: String,
}

/// Request body for creating a new quiz.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub question: String,
    pub answer: String,
}

/// Sort order for quiz listings, by creation timestamp.
///
/// Ties are broken by id ascending so pagination is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    CreatedDesc,
    CreatedAsc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::CreatedDesc
    }
}

/// Post-pagination status filter for annotated quiz listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    All,
    /// At least one attempt and the most recent verdict is wrong.
    IncorrectOnly,
    /// Zero attempts so far.
    UnansweredOnly,
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::All
    }
}

/// A quiz annotated with its answer-attempt status for list views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizWithStatus {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: String,
    pub attempts: i64,
    /// None when the quiz has never been answered.
    pub last_correct: Option<bool>,
}

/// Per-user statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_quizzes: i64,
    pub attempts: i64,
    pub correct_attempts: i64,
    /// correct_attempts / attempts, or 0.0 when there are no attempts.
    pub accuracy: f64,
}
