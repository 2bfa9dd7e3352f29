//! Image generation via an external txt2img backend.
//!
//! The backend (an AUTOMATIC1111-compatible HTTP API) is treated as an opaque
//! synchronous call: prompt in, PNG bytes out, with a hard timeout and no
//! retries. This module also owns everything filesystem-side; the repository
//! stores image rows, never files.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{GeneratedImage, Quiz};

// Fixed generation parameters; tuned for small mnemonic illustrations.
const GEN_STEPS: u32 = 20;
const GEN_WIDTH: u32 = 768;
const GEN_HEIGHT: u32 = 512;
const GEN_SAMPLER: &str = "Euler a";

/// Request payload for the txt2img endpoint.
#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    steps: u32,
    width: u32,
    height: u32,
    sampler_name: &'a str,
    seed: i64,
}

/// The slice of the txt2img response we care about.
#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// Client for the external image generation backend plus the orchestration
/// logic that ties generated files to image records.
pub struct ImageGenerator {
    http: reqwest::Client,
    base_url: String,
    image_dir: PathBuf,
}

impl ImageGenerator {
    /// Create a generator. Ensures the image directory exists.
    pub fn new(base_url: &str, image_dir: &Path, timeout_secs: u64) -> Result<Self, AppError> {
        std::fs::create_dir_all(image_dir)
            .map_err(|e| AppError::Internal(format!("Cannot create image directory: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_dir: image_dir.to_path_buf(),
        })
    }

    /// Generate (or reuse) an image for a quiz.
    ///
    /// Policy: with `replace == false`, an existing image is reused and the
    /// backend is not called again. With `replace == true`, all prior images
    /// for the quiz (files first, then records) are removed before the new
    /// generation, so a failed backend call leaves the quiz with zero images
    /// rather than a duplicate.
    pub async fn generate_for_quiz(
        &self,
        repo: &Repository,
        quiz: &Quiz,
        user_prompt: Option<&str>,
        replace: bool,
    ) -> Result<GeneratedImage, AppError> {
        if !replace {
            if let Some(existing) = repo.latest_image_by_quiz(quiz.id).await? {
                tracing::debug!(quiz_id = quiz.id, image_id = existing.id, "Reusing image");
                return Ok(existing);
            }
        } else {
            let old = repo.list_images_by_quiz(quiz.id).await?;
            if !old.is_empty() {
                let paths: Vec<String> = old.iter().map(|im| im.file_path.clone()).collect();
                self.remove_files(&paths).await;
                let removed = repo.delete_images_by_quiz(quiz.id).await?;
                tracing::info!(quiz_id = quiz.id, removed, "Evicted old images before regeneration");
            }
        }

        let prompt = build_prompt(quiz, user_prompt);
        let png = self.txt2img(&prompt).await?;
        let file_name = self.save_image(quiz.id, &png).await?;

        repo.add_image(quiz.id, &file_name, Some(&prompt)).await
    }

    /// Call the txt2img endpoint and decode the first returned image.
    async fn txt2img(&self, prompt: &str) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/sdapi/v1/txt2img", self.base_url);
        let payload = Txt2ImgRequest {
            prompt,
            steps: GEN_STEPS,
            width: GEN_WIDTH,
            height: GEN_HEIGHT,
            sampler_name: GEN_SAMPLER,
            seed: -1,
        };

        let resp = self.http.post(&url).json(&payload).send().await?;

        if !resp.status().is_success() {
            tracing::error!(status = %resp.status(), "txt2img backend returned non-success");
            return Err(AppError::Generation(
                "Image generation backend returned an error".to_string(),
            ));
        }

        let body: Txt2ImgResponse = resp.json().await?;
        let b64 = body.images.first().ok_or_else(|| {
            AppError::Generation("Image generation backend returned no image".to_string())
        })?;

        BASE64.decode(b64).map_err(|e| {
            tracing::error!("Undecodable image payload: {}", e);
            AppError::Generation("Image generation backend returned an unusable payload".to_string())
        })
    }

    /// Write PNG bytes under the image directory and return the bare file name.
    ///
    /// The name carries a second-granularity timestamp plus a random suffix,
    /// so concurrent generations for the same quiz cannot collide.
    async fn save_image(&self, quiz_id: i64, png: &[u8]) -> Result<String, AppError> {
        let file_name = image_file_name(quiz_id);
        let path = self.image_dir.join(&file_name);
        tokio::fs::write(&path, png).await?;
        Ok(file_name)
    }

    /// Best-effort removal of backing files. A missing file is not an error.
    pub async fn remove_files(&self, file_names: &[String]) {
        for name in file_names {
            // Basename-only join; stored names must never escape image_dir
            let Some(base) = Path::new(name).file_name() else {
                continue;
            };
            let path = self.image_dir.join(base);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove image file {:?}: {}", path, e),
            }
        }
    }
}

/// Resolve the effective prompt: the user's own, verbatim, when supplied and
/// non-blank, otherwise a deterministic mnemonic-illustration default built
/// from the question text.
pub fn build_prompt(quiz: &Quiz, user_prompt: Option<&str>) -> String {
    match user_prompt.filter(|p| !p.trim().is_empty()) {
        Some(p) => p.to_string(),
        None => format!(
            "Create a clear, mnemonic illustration for vocabulary learning. \
             Keyword: '{}'. Simple background, high contrast, \
             descriptive details, educational style.",
            quiz.question
        ),
    }
}

/// Derive a file name for a quiz's generated image.
fn image_file_name(quiz_id: i64) -> String {
    let ts = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("quiz_{}_{}_{}.png", quiz_id, ts, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(question: &str) -> Quiz {
        Quiz {
            id: 7,
            question: question.to_string(),
            answer: "irrelevant".to_string(),
            user_id: 1,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_build_prompt_uses_user_prompt_verbatim() {
        let q = quiz("apple");
        assert_eq!(
            build_prompt(&q, Some("a red fruit on a table")),
            "a red fruit on a table"
        );
    }

    #[test]
    fn test_build_prompt_default_embeds_question() {
        let q = quiz("apple");
        let prompt = build_prompt(&q, None);
        assert!(prompt.contains("'apple'"));
        assert!(prompt.contains("mnemonic illustration"));
    }

    #[test]
    fn test_build_prompt_preserves_user_whitespace() {
        let q = quiz("apple");
        // Non-blank prompts pass through untouched, padding included
        assert_eq!(
            build_prompt(&q, Some("  a red fruit  ")),
            "  a red fruit  "
        );
    }

    #[test]
    fn test_build_prompt_blank_user_prompt_falls_back() {
        let q = quiz("apple");
        let prompt = build_prompt(&q, Some("   "));
        assert!(prompt.contains("'apple'"));
    }

    #[test]
    fn test_image_file_name_shape() {
        let name = image_file_name(42);
        assert!(name.starts_with("quiz_42_"));
        assert!(name.ends_with(".png"));
        // quiz_42_YYYYMMDD_HHMMSS_xxxxxxxx.png
        assert_eq!(name.split('_').count(), 5);
    }

    #[test]
    fn test_image_file_names_do_not_collide() {
        let a = image_file_name(1);
        let b = image_file_name(1);
        assert_ne!(a, b);
    }
}
