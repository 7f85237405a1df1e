//! ERP inventory stock accounting service
//!
//! Number sequences, the per-lane stock ledger, stock adjustments and
//! stock transfers, served over a JSON API.

use std::{sync::Arc, time::Duration};

use axum::{routing::get, Router};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "erp_stock=debug,erp_stock_server=debug,tower_http=debug,sqlx=warn".into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connection pool whose sessions carry the configured lock and statement
/// timeouts
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let lock_timeout = config.database.lock_timeout_ms;
    let statement_timeout = config.database.statement_timeout_ms;

    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(
                    format!(
                        "SET lock_timeout = {}; SET statement_timeout = {}",
                        lock_timeout, statement_timeout
                    )
                    .as_str(),
                )
                .await?;
                Ok(())
            })
        })
        .connect(&config.database.url)
        .await
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "ERP Stock API v1"
}
