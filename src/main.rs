use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

use gradebook::logging::{init_tracing, shutdown_tracer};
use gradebook::metrics::{init_metrics, metrics_app, set_observability_enabled};
use gradebook::router::init_router;
use gradebook::state::AppState;
use gradebook_config::{CorsConfig, DatabaseConfig, JwtConfig, ServerConfig};
use gradebook_db::{init_db_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let server_config = ServerConfig::from_env();
    set_observability_enabled(server_config.observability_enabled);
    init_tracing(&server_config.environment).context("Failed to initialize logging")?;

    let database_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_config)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;
    info!("Database ready");

    let state = AppState::new(db, JwtConfig::from_env(), CorsConfig::from_env())
        .context("Failed to load report templates")?;
    let app = init_router(state);

    if let Some(handle) = init_metrics().context("Failed to install metrics recorder")? {
        let metrics_address = server_config.metrics_address();
        let listener = tokio::net::TcpListener::bind(&metrics_address)
            .await
            .with_context(|| format!("Failed to bind metrics server to {metrics_address}"))?;
        info!(address = %metrics_address, "Metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!(address = %address, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    let result = axum::serve(listener, app).await;
    shutdown_tracer();
    result.context("Server error")
}
