//! Design Hub Backend
//!
//! REST backend for sharing design resources, with SQLite persistence, Tantivy
//! full-text search and Google sign-in.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod feed;
mod models;
mod query;
mod search;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{GoogleProvider, IdentityProvider, TokenService};
use config::Config;
use db::Repository;
use feed::ChangeFeed;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub feed: ChangeFeed,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Design Hub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Frontend URL: {}", config.frontend_url);

    if config.google.client_id.is_empty() {
        tracing::warn!("GOOGLE_CLIENT_ID is not set. Sign-in will fail!");
    }

    let jwt_secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!(
                "No HUB_JWT_SECRET configured. Using a random secret; sessions end on restart!"
            );
            format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
        }
    };

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if config.seed_sample {
        db::seed_sample_data(&repo).await?;
    }

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let resources = repo.list_resources().await?;
    search.rebuild(&resources).await?;

    let state = AppState {
        repo,
        search,
        tokens: Arc::new(TokenService::new(&jwt_secret, config.jwt_issuer.clone())),
        identity: Arc::new(GoogleProvider::new(config.google.clone())),
        feed: ChangeFeed::new(),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    let api_routes = Router::new()
        // Resources
        .route(
            "/resources",
            get(api::list_resources).post(api::create_resource),
        )
        .route("/resources/revision", get(api::get_revision))
        .route("/resources/stream", get(api::stream_resources))
        .route(
            "/resources/{id}",
            get(api::get_resource)
                .put(api::update_resource)
                .delete(api::delete_resource),
        )
        .route("/resources/{id}/like", post(api::toggle_like))
        // Search
        .route("/search", get(api::search_resources))
        // Auth
        .route("/auth/google", get(api::google_login))
        .route("/auth/google/callback", get(api::google_callback))
        .route("/auth/me", get(api::current_user))
        .route("/auth/logout", post(api::logout))
        // Admin
        .route("/admin/users", get(api::list_users))
        .route("/admin/users/{id}", delete(api::delete_user))
        .route("/admin/users/{id}/admin", put(api::set_user_admin))
        .route("/admin/stats", get(api::get_stats))
        .route("/admin/contributors", get(api::list_contributors));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS for the configured frontend origin, with credentials.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL {:?} is not a valid origin", frontend_url);
            layer
        }
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
