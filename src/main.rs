//! QuizPix Backend
//!
//! REST backend for a picture-assisted quiz application: users submit
//! question/answer pairs, generate mnemonic illustrations for them via an
//! external txt2img backend, and log answer attempts with accuracy stats.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod imagegen;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use imagegen::ImageGenerator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub imagegen: Arc<ImageGenerator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QuizPix Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Image directory: {:?}", config.image_dir);
    tracing::info!("txt2img backend: {}", config.sd_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize the image generation client
    let imagegen = Arc::new(ImageGenerator::new(
        &config.sd_base_url,
        &config.image_dir,
        config.sd_timeout_secs,
    )?);

    // Create application state
    let state = AppState {
        repo,
        imagegen,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    // expose_headers so browser clients can read a minted X-Client-Token
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Clone the repository for the identity layer
    let identity_repo = state.repo.clone();

    // API routes; every request passes through identity resolution
    let api_routes = Router::new()
        // Quizzes
        .route("/quiz", post(api::create_quiz))
        .route("/quiz", get(api::list_quizzes))
        .route("/quiz/{id}", delete(api::delete_quiz))
        // Images
        .route("/quiz/{id}/images/latest", get(api::latest_image))
        .route("/quiz/{id}/images/generate", post(api::generate_image))
        // Answers
        .route("/quiz/{id}/answer", post(api::submit_answer))
        // Stats
        .route("/stats/summary", get(api::stats_summary))
        // Apply identity middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::identity_layer(identity_repo.clone(), req, next)
        }));

    // Health check (no identity resolution)
    let health_routes = Router::new().route("/health", get(health_check));

    // Generated images are served read-only by relative path
    let images_service = ServeDir::new(&state.config.image_dir);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .nest_service("/images", images_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
