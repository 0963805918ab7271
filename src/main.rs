//! TeamTime Backend
//!
//! REST backend for a team time-tracking dashboard: one running timer per
//! user, a ledger of recorded entries, team statistics and presence rooms.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod filter;
mod format;
mod models;
mod stats;
mod timer;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::JwtConfig;
use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
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

    tracing::info!("Starting TeamTime Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Local UTC offset: {}", config.local_offset());

    let jwt = Arc::new(JwtConfig::from_config(&config));

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(admin) = &config.bootstrap_admin {
        let hash = auth::hash_password(&admin.password)?;
        if let Some(user) = repo.ensure_bootstrap_admin(admin, &hash).await? {
            tracing::info!("Created bootstrap admin {}", user.email);
        }
    } else if repo.count_users().await? == 0 {
        tracing::warn!(
            "No users exist and no bootstrap admin is configured (TEAMTIME_ADMIN_EMAIL / TEAMTIME_ADMIN_PASSWORD). Nobody can log in."
        );
    }

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
        jwt,
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

    // API routes. Access is enforced per handler by the auth extractors.
    let api_routes = Router::new()
        // Auth
        .route("/auth/login", post(api::login))
        .route("/auth/me", get(api::me))
        .route("/auth/change-password", post(api::change_password))
        .route("/revision", get(api::get_revision))
        // Users
        .route("/users", get(api::list_users).post(api::create_user))
        .route(
            "/users/{id}",
            axum::routing::patch(api::update_user).delete(api::delete_user),
        )
        // Categories
        .route(
            "/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route(
            "/categories/{id}",
            put(api::update_category).delete(api::delete_category),
        )
        // Tags
        .route("/tags", get(api::list_tags).post(api::create_tag))
        .route("/tags/{id}", put(api::update_tag).delete(api::delete_tag))
        // Time entries
        .route(
            "/time-entries",
            get(api::list_entries).post(api::create_entry),
        )
        .route(
            "/time-entries/{id}",
            put(api::update_entry).delete(api::delete_entry),
        )
        // Team
        .route("/team/entries", get(api::list_team_entries))
        .route(
            "/team/active",
            get(api::list_active_timers)
                .post(api::start_timer)
                .put(api::update_timer)
                .delete(api::discard_timer),
        )
        .route("/team/active/me", get(api::get_my_timer))
        .route("/team/active/stop", post(api::stop_timer))
        // Statistics
        .route("/admin/stats", get(api::get_stats))
        .route("/admin/stats/timeseries", get(api::get_timeseries))
        // Rooms
        .route("/rooms", get(api::list_rooms).post(api::create_room))
        .route("/rooms/{id}", put(api::update_room).delete(api::delete_room))
        .route("/rooms/{id}/join", post(api::join_room))
        .route("/rooms/{id}/leave", post(api::leave_room));

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
