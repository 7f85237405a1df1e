//! ERP stock server binary

use std::{net::SocketAddr, sync::Arc};

use erp_stock::{create_app, create_pool, init_tracing, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    init_tracing(&config);

    tracing::info!(environment = %config.environment, "starting ERP stock server");

    let db_pool = create_pool(&config).await?;
    tracing::info!("database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("migrations completed");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
    };

    let app = create_app(state);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
