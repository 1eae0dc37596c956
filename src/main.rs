//! School Records Backend
//!
//! REST backend for school administration records and statistics, with SQLite document
//! persistence.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod query;
mod records;
mod reports;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::{DocumentStore, Repository, SqliteStore};
use models::{Admissions, Classes, Marks, StaffMembers, Students};
use reports::Reporter;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub reports: Arc<Reporter>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Arc::new(Repository::new(store.clone())),
            reports: Arc::new(Reporter::new(store)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Starting School Records Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::new(pool.clone(), config.store_timeout));

    let state = AppState::new(store);
    state.repo.ensure_indexes().await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Students
        .route(
            "/students",
            get(api::list_records::<Students>).post(api::create_record::<Students>),
        )
        .route("/students/migrate", post(api::migrate_students))
        .route(
            "/students/{id}",
            get(api::get_record::<Students>)
                .put(api::update_record::<Students>)
                .delete(api::delete_record::<Students>),
        )
        // Admissions
        .route(
            "/admissions",
            get(api::list_records::<Admissions>).post(api::create_record::<Admissions>),
        )
        .route(
            "/admissions/{id}",
            get(api::get_record::<Admissions>)
                .put(api::update_record::<Admissions>)
                .delete(api::delete_record::<Admissions>),
        )
        .route(
            "/admissions/{id}/status",
            patch(api::update_admission_status),
        )
        // Staff
        .route(
            "/staff",
            get(api::list_records::<StaffMembers>).post(api::create_record::<StaffMembers>),
        )
        .route(
            "/staff/{id}",
            get(api::get_record::<StaffMembers>)
                .put(api::update_record::<StaffMembers>)
                .delete(api::delete_record::<StaffMembers>),
        )
        .route("/teachers", get(api::list_teachers))
        .route("/support-staff", get(api::list_support_staff))
        // Marks
        .route(
            "/marks",
            get(api::list_records::<Marks>).post(api::create_record::<Marks>),
        )
        .route(
            "/marks/{id}",
            get(api::get_record::<Marks>)
                .put(api::update_record::<Marks>)
                .delete(api::delete_record::<Marks>),
        )
        // Classes
        .route(
            "/classes",
            get(api::list_records::<Classes>).post(api::create_record::<Classes>),
        )
        .route(
            "/classes/{id}",
            get(api::get_record::<Classes>)
                .put(api::update_record::<Classes>)
                .delete(api::delete_record::<Classes>),
        )
        // Reports
        .route("/reports/teachers/subjects", get(api::teachers_by_subject))
        .route(
            "/reports/teachers/designations",
            get(api::teachers_by_designation),
        )
        .route(
            "/reports/staff/designations",
            get(api::support_staff_by_designation),
        )
        .route("/reports/students/classes", get(api::students_by_class))
        .route("/reports/students/religions", get(api::students_by_religion))
        .route("/reports/students/genders", get(api::students_by_gender))
        .route(
            "/reports/students/class-religion",
            get(api::students_by_class_and_religion),
        )
        .route(
            "/reports/students/class-section",
            get(api::students_by_class_and_section),
        )
        .route("/reports/overview", get(api::overview));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

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

async fn root() -> &'static str {
    "School Server is running!"
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
