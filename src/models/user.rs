//! User model. One row per distinct client token.

use serde::{Deserialize, Serialize};

/// A user identified by an opaque client token.
///
/// Created on first sight of a token and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub token: String,
    pub created_at: String,
}
