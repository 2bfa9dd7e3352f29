//! Configuration module for the QuizPix backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory where generated images are stored
    pub image_dir: PathBuf,
    /// Base URL of the txt2img generation backend
    pub sd_base_url: String,
    /// Request timeout for the generation backend, in seconds
    pub sd_timeout_secs: u64,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("QUIZPIX_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let image_dir = env::var("QUIZPIX_IMAGE_DIR")
            .unwrap_or_else(|_| "./data/images".to_string())
            .into();

        let sd_base_url =
            env::var("QUIZPIX_SD_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:7860".to_string());

        let sd_timeout_secs = env::var("QUIZPIX_SD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        let bind_addr = env::var("QUIZPIX_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid QUIZPIX_BIND_ADDR format");

        let log_level = env::var("QUIZPIX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            image_dir,
            sd_base_url,
            sd_timeout_secs,
            bind_addr,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("QUIZPIX_DB_PATH");
        env::remove_var("QUIZPIX_IMAGE_DIR");
        env::remove_var("QUIZPIX_SD_BASE_URL");
        env::remove_var("QUIZPIX_SD_TIMEOUT_SECS");
        env::remove_var("QUIZPIX_BIND_ADDR");
        env::remove_var("QUIZPIX_LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(config.image_dir, PathBuf::from("./data/images"));
        assert_eq!(config.sd_base_url, "http://127.0.0.1:7860");
        assert_eq!(config.sd_timeout_secs, 120);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }
}
