//! Campus Events
//!
//! Main application entry point

use anyhow::Context;
use tracing::{info, warn};

use campus_events::{
    config::Settings,
    database::{self, DatabaseService},
    handlers::{router, AppState},
    middleware::build_rate_limiter,
    services::{FileStorage, RedisService, ServiceFactory},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration
    dotenv::dotenv().ok();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_file(&path),
        None => Settings::new(),
    }
    .context("Failed to load configuration")?;
    settings.validate()?;

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", campus_events::info());

    info!("Connecting to database...");
    let pool = database::create_pool(&settings.database).await?;

    info!("Running database migrations...");
    database::run_migrations(&pool).await?;
    let db = DatabaseService::new(pool);

    let redis = match RedisService::new(&settings.redis) {
        Ok(redis) => match redis.health_check().await {
            Ok(true) => Some(redis),
            _ => {
                warn!(url = %settings.redis.url, "Redis is not reachable, continuing without it");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "Invalid Redis configuration, continuing without it");
            None
        }
    };

    info!("Initializing services...");
    let storage = FileStorage::from_config(&settings.storage)?;
    let gateway = ServiceFactory::payment_gateway(&settings)?;
    let services = ServiceFactory::new(&settings, db.clone(), redis.clone(), storage, gateway);
    let rate_limiter = build_rate_limiter(&settings.rate_limit, redis);

    let addr = settings.server.socket_addr().context("Invalid server address")?;
    let app = router(AppState::new(settings, db, services, rate_limiter));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Campus Events has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
