//! Stats API endpoints.

use axum::{extract::State, Extension};

use super::{success, ApiResult};
use crate::models::{StatsSummary, User};
use crate::AppState;

/// GET /api/stats/summary - Per-user attempt/accuracy summary.
pub async fn stats_summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<StatsSummary> {
    let summary = state.repo.stats_summary(user.id).await?;
    success(summary)
}
