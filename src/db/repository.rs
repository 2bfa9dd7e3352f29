//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. Every
//! quiz-scoped read/write goes through the `(id, user_id)` ownership filter;
//! a quiz id alone is never a sufficient key.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    AnswerLog, GeneratedImage, Quiz, QuizWithStatus, SortOrder, StatsSummary, StatusFilter, User,
};

/// Hard ceiling on page size to prevent unbounded scans.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Look up a user by their opaque client token.
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, token, created_at FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get the user for a token, creating one on first sight.
    ///
    /// Idempotent under concurrent calls with the same token: a duplicate
    /// insert loses the unique-constraint race and is retried as a lookup.
    pub async fn resolve_user(&self, token: &str) -> Result<User, AppError> {
        if let Some(user) = self.get_user_by_token(token).await? {
            return Ok(user);
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("INSERT INTO users (token, created_at) VALUES (?, ?)")
            .bind(token)
            .bind(&now)
            .execute(&self.pool)
            .await;

        match result {
            Ok(res) => Ok(User {
                id: res.last_insert_rowid(),
                token: token.to_string(),
                created_at: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => self
                .get_user_by_token(token)
                .await?
                .ok_or_else(|| AppError::Internal("User vanished after insert race".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    // ==================== QUIZ OPERATIONS ====================

    /// Create a new quiz owned by the given user.
    pub async fn create_quiz(
        &self,
        user_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<Quiz, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO quizzes (question, answer, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(question)
        .bind(answer)
        .bind(user_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Quiz {
            id: result.last_insert_rowid(),
            question: question.to_string(),
            answer: answer.to_string(),
            user_id,
            created_at: now,
        })
    }

    /// List a user's quizzes with optional substring filter, sorting and pagination.
    ///
    /// The filter matches case-insensitively against question OR answer.
    pub async fn list_quizzes(
        &self,
        user_id: i64,
        filter: Option<&str>,
        order: SortOrder,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Quiz>, AppError> {
        let order_sql = match order {
            SortOrder::CreatedDesc => "created_at DESC, id ASC",
            SortOrder::CreatedAsc => "created_at ASC, id ASC",
        };
        let limit = limit.clamp(0, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        let rows = match filter.filter(|f| !f.is_empty()) {
            Some(f) => {
                let like = format!("%{}%", f.to_lowercase());
                sqlx::query(&format!(
                    "SELECT id, question, answer, user_id, created_at FROM quizzes \
                     WHERE user_id = ? AND (LOWER(question) LIKE ? OR LOWER(answer) LIKE ?) \
                     ORDER BY {} LIMIT ? OFFSET ?",
                    order_sql
                ))
                .bind(user_id)
                .bind(&like)
                .bind(&like)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT id, question, answer, user_id, created_at FROM quizzes \
                     WHERE user_id = ? ORDER BY {} LIMIT ? OFFSET ?",
                    order_sql
                ))
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(quiz_from_row).collect())
    }

    /// Fetch a quiz by id, scoped to its owner.
    ///
    /// Returns None both when the quiz does not exist and when it belongs to
    /// a different user; callers cannot tell the two apart.
    pub async fn get_quiz_owned(&self, id: i64, user_id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query(
            "SELECT id, question, answer, user_id, created_at FROM quizzes WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(quiz_from_row))
    }

    /// Delete a quiz and, in the same transaction, all its answer logs and
    /// image records.
    ///
    /// Returns the orphaned image file names so the caller can remove the
    /// backing files after the transaction commits (the store itself never
    /// touches the filesystem). None when the quiz is absent or not owned.
    pub async fn delete_quiz_owned(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Vec<String>>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM quizzes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let file_rows = sqlx::query("SELECT file_path FROM generated_images WHERE quiz_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let file_paths: Vec<String> = file_rows.iter().map(|r| r.get("file_path")).collect();

        sqlx::query("DELETE FROM answer_logs WHERE quiz_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM generated_images WHERE quiz_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(file_paths))
    }

    /// Count a user's quizzes.
    pub async fn count_quizzes(&self, user_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quizzes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ==================== IMAGE OPERATIONS ====================

    /// Record a newly generated image for a quiz.
    pub async fn add_image(
        &self,
        quiz_id: i64,
        file_path: &str,
        prompt: Option<&str>,
    ) -> Result<GeneratedImage, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO generated_images (quiz_id, file_path, prompt, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(file_path)
        .bind(prompt)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(GeneratedImage {
            id: result.last_insert_rowid(),
            quiz_id,
            file_path: file_path.to_string(),
            prompt: prompt.map(|p| p.to_string()),
            created_at: now,
        })
    }

    /// List a quiz's images, newest first.
    pub async fn list_images_by_quiz(&self, quiz_id: i64) -> Result<Vec<GeneratedImage>, AppError> {
        let rows = sqlx::query(
            "SELECT id, quiz_id, file_path, prompt, created_at FROM generated_images \
             WHERE quiz_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(image_from_row).collect())
    }

    /// Get the most recently created image for a quiz, if any.
    pub async fn latest_image_by_quiz(
        &self,
        quiz_id: i64,
    ) -> Result<Option<GeneratedImage>, AppError> {
        let row = sqlx::query(
            "SELECT id, quiz_id, file_path, prompt, created_at FROM generated_images \
             WHERE quiz_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(image_from_row))
    }

    /// Delete all image records for a quiz. Records only; backing files are
    /// the orchestrator's problem.
    pub async fn delete_images_by_quiz(&self, quiz_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM generated_images WHERE quiz_id = ?")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== ANSWER OPERATIONS ====================

    /// Record an answer attempt and return the correctness verdict.
    ///
    /// The verdict is computed here, once, by normalized comparison against
    /// the quiz's stored answer, and frozen into the log row.
    pub async fn log_answer(
        &self,
        user_id: i64,
        quiz: &Quiz,
        user_answer: &str,
        image_shown: bool,
    ) -> Result<(bool, AnswerLog), AppError> {
        let correct = normalize_answer(user_answer) == normalize_answer(&quiz.answer);
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO answer_logs (user_id, quiz_id, is_correct, user_answer, image_shown, answered_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(quiz.id)
        .bind(correct as i32)
        .bind(user_answer)
        .bind(image_shown as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let log = AnswerLog {
            id: result.last_insert_rowid(),
            user_id,
            quiz_id: quiz.id,
            is_correct: correct,
            user_answer: user_answer.to_string(),
            image_shown,
            answered_at: now,
        };

        Ok((correct, log))
    }

    /// Number of attempts a user has made on a quiz.
    pub async fn attempt_count(&self, user_id: i64, quiz_id: i64) -> Result<i64, AppError> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM answer_logs WHERE user_id = ? AND quiz_id = ?")
                .bind(user_id)
                .bind(quiz_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.get("n"))
    }

    /// Correctness of the most recent attempt, None when there are no attempts.
    pub async fn last_correctness(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Option<bool>, AppError> {
        let row = sqlx::query(
            "SELECT is_correct FROM answer_logs WHERE user_id = ? AND quiz_id = ? \
             ORDER BY answered_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let v: i64 = r.get("is_correct");
            v != 0
        }))
    }

    // ==================== STATS OPERATIONS ====================

    /// Per-user summary: quiz count, attempts, correct attempts, accuracy.
    pub async fn stats_summary(&self, user_id: i64) -> Result<StatsSummary, AppError> {
        let total_quizzes = self.count_quizzes(user_id).await?;

        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(is_correct), 0) AS correct \
             FROM answer_logs WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let attempts: i64 = row.get("total");
        let correct_attempts: i64 = row.get("correct");

        let accuracy = if attempts > 0 {
            correct_attempts as f64 / attempts as f64
        } else {
            0.0
        };

        Ok(StatsSummary {
            total_quizzes,
            attempts,
            correct_attempts,
            accuracy,
        })
    }

    /// List a user's quizzes annotated with attempt status, with an optional
    /// status post-filter.
    ///
    /// The status filter runs after pagination of the base query, so a page
    /// can come back shorter than `limit` even when more matching quizzes
    /// exist further along the unfiltered order. Known paging behavior.
    pub async fn list_quizzes_with_status(
        &self,
        user_id: i64,
        filter: Option<&str>,
        order: SortOrder,
        offset: i64,
        limit: i64,
        status: StatusFilter,
    ) -> Result<Vec<QuizWithStatus>, AppError> {
        let quizzes = self
            .list_quizzes(user_id, filter, order, offset, limit)
            .await?;

        let mut out = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let attempts = self.attempt_count(user_id, quiz.id).await?;
            let last_correct = self.last_correctness(user_id, quiz.id).await?;

            let keep = match status {
                StatusFilter::All => true,
                StatusFilter::IncorrectOnly => attempts > 0 && last_correct == Some(false),
                StatusFilter::UnansweredOnly => attempts == 0,
            };
            if !keep {
                continue;
            }

            out.push(QuizWithStatus {
                id: quiz.id,
                question: quiz.question,
                answer: quiz.answer,
                created_at: quiz.created_at,
                attempts,
                last_correct,
            });
        }

        Ok(out)
    }
}

/// Normalization used for answer judging: trim whitespace, lowercase.
pub fn normalize_answer(s: &str) -> String {
    s.trim().to_lowercase()
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        token: row.get("token"),
        created_at: row.get("created_at"),
    }
}

fn quiz_from_row(row: &sqlx::sqlite::SqliteRow) -> Quiz {
    Quiz {
        id: row.get("id"),
        question: row.get("question"),
        answer: row.get("answer"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}

fn image_from_row(row: &sqlx::sqlite::SqliteRow) -> GeneratedImage {
    GeneratedImage {
        id: row.get("id"),
        quiz_id: row.get("quiz_id"),
        file_path: row.get("file_path"),
        prompt: row.get("prompt"),
        created_at: row.get("created_at"),
    }
}
