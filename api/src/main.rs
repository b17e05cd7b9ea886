//! KitchenPlaner API Server
//!
//! Backend for cooperatively planning the meals of a campout.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    create_schema, DbProjectRepository, DbRecipeRepository, DbSessionRepository, DbUserRepository,
    FsImageStore,
};
use app::{
    AuthService, ImageService, Preloader, ProjectOrganisationService, ProjectService,
    RecipeService,
};
use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<DbUserRepository, DbSessionRepository>>,
    pub project_service: Arc<ProjectService<DbProjectRepository, DbRecipeRepository>>,
    pub organisation_service: Arc<ProjectOrganisationService<DbProjectRepository, FsImageStore>>,
    pub recipe_service: Arc<RecipeService<DbRecipeRepository>>,
    pub image_service:
        Arc<ImageService<DbProjectRepository, DbRecipeRepository, FsImageStore>>,
    pub config: Config,
}

impl AppState {
    /// Wire adapters and services on top of one database connection
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let user_repo = Arc::new(DbUserRepository::new(db.clone()));
        let session_repo = Arc::new(DbSessionRepository::new(db.clone()));
        let project_repo = Arc::new(DbProjectRepository::new(db.clone()));
        let recipe_repo = Arc::new(DbRecipeRepository::new(db));
        let image_store = Arc::new(FsImageStore::new(config.image_dir.clone()));

        Self {
            auth_service: Arc::new(AuthService::new(
                user_repo,
                session_repo,
                config.session_ttl_hours,
            )),
            project_service: Arc::new(ProjectService::new(
                project_repo.clone(),
                recipe_repo.clone(),
            )),
            organisation_service: Arc::new(ProjectOrganisationService::new(
                project_repo.clone(),
                image_store.clone(),
                config.api_base_url.clone(),
            )),
            recipe_service: Arc::new(RecipeService::new(recipe_repo.clone())),
            image_service: Arc::new(ImageService::new(
                project_repo,
                recipe_repo,
                image_store,
                config.max_image_bytes,
            )),
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes and middleware
pub fn app_router(state: AppState) -> anyhow::Result<Router> {
    // Registration and login are public
    let mut auth_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    if state.config.rate_limit_enabled {
        // 2 req/sec sustained, burst of 5, keyed by the peer address of the socket
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .key_extractor(PeerIpKeyExtractor)
                .per_second(2)
                .burst_size(5)
                .finish()
                .context("Failed to build governor config")?,
        );
        auth_routes = auth_routes.layer(GovernorLayer {
            config: governor_config,
        });
    }

    // Multipart framing needs some room on top of the image itself
    let body_limit = state.config.max_image_bytes.saturating_add(64 * 1024);
    let media_routes = Router::new()
        .route(
            "/media/projects/:id/image",
            post(handlers::upload_project_image)
                .get(handlers::get_project_image)
                .delete(handlers::delete_project_image),
        )
        .route(
            "/media/recipes/:id/image",
            post(handlers::upload_recipe_image)
                .get(handlers::get_recipe_image)
                .delete(handlers::delete_recipe_image),
        )
        .layer(DefaultBodyLimit::max(body_limit));

    let protected_routes = Router::new()
        .route("/auth/logout", post(handlers::logout))
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/projects/join", post(handlers::join_project))
        .route("/projects/join/:token", post(handlers::join_project_by_token))
        .route(
            "/projects/:id",
            get(handlers::get_project).put(handlers::update_project),
        )
        .route("/projects/:id/version", get(handlers::get_project_version))
        .route("/projects/:id/invitation", get(handlers::get_invitation_link))
        .route("/projects/:id/leave", post(handlers::leave_project))
        // Recipes
        .route(
            "/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/recipes/:id",
            get(handlers::get_recipe).put(handlers::update_recipe),
        )
        .route("/recipes/:id/version", get(handlers::get_recipe_version))
        // Images
        .merge(media_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Ok(Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(protected_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kitchenplaner_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting KitchenPlaner API...");

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    create_schema(&db)
        .await
        .context("Failed to create database schema")?;
    tracing::info!("Database ready");

    if config.seed_demo_data {
        let preloader = Preloader::new(
            Arc::new(DbUserRepository::new(db.clone())),
            Arc::new(DbProjectRepository::new(db.clone())),
            Arc::new(DbRecipeRepository::new(db.clone())),
        );
        preloader
            .seed(config.demo_password.as_deref())
            .await
            .context("Failed to insert demo data")?;
    }

    let state = AppState::new(db, config.clone());
    let app = app_router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
