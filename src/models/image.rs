//! Generated image model.

use serde::{Deserialize, Serialize};

/// An illustrative image generated for one quiz.
///
/// `file_path` is the bare file name relative to the configured image
/// directory; the quiz's "current" image is the most recently created row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: i64,
    pub quiz_id: i64,
    pub file_path: String,
    pub prompt: Option<String>,
    pub created_at: String,
}

/// Request body for generating an image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    /// Custom prompt; when absent a default is synthesized from the question.
    #[serde(default)]
    pub prompt: Option<String>,
}
