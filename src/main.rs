//! HackMate Backend
//!
//! REST backend for the hackathon team-membership lifecycle, with SQLite
//! persistence. Registration roles and team rosters are only ever mutated
//! through the membership coordinator.

mod api;
mod auth;
mod config;
mod coordinator;
mod db;
mod errors;
mod invite;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use coordinator::Coordinator;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub coordinator: Arc<Coordinator>,
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

    tracing::info!("Starting HackMate Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (HACKMATE_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool.clone()));
    let coordinator = Arc::new(Coordinator::new(pool));

    // Create application state
    let state = AppState {
        repo,
        coordinator,
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
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Hackathon catalog
        .route("/hackathons", get(api::list_hackathons))
        .route("/hackathons", post(api::create_hackathon))
        .route("/hackathons/{hid}", get(api::get_hackathon))
        // Registration
        .route("/hackathons/{hid}/register", post(api::register))
        .route("/hackathons/{hid}/my-registration", get(api::my_registration))
        // Team lifecycle
        .route("/hackathons/{hid}/team/create", post(api::create_team))
        .route("/hackathons/{hid}/team/join", post(api::join_team))
        .route("/hackathons/{hid}/team/leave", post(api::leave_team))
        .route(
            "/hackathons/{hid}/team/remove-member",
            post(api::remove_member),
        )
        .route(
            "/hackathons/{hid}/team/transfer-leadership",
            post(api::transfer_leadership),
        )
        .route("/hackathons/{hid}/team/delete", delete(api::delete_team))
        .route("/hackathons/{hid}/team/{tid}", get(api::get_team))
        .route("/hackathons/{hid}/teams", get(api::list_teams))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
