//! Roost calendar sync daemon.
//!
//! Wires the SQLite store, the feed client, and the sync orchestrator
//! together, then runs fleet sync on the configured cron schedule until
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use roost_core::CalendarSyncService;
use roost_domain::{Result, RoostError};
use roost_infra::database::{DbManager, SqliteListingRepository, SqliteReservationRepository};
use roost_infra::http::IcsFeedClient;
use roost_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ROOST_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded environment from .env"),
        Err(_) => info!("no .env file found, using process environment"),
    }

    let config = roost_infra::config::load()?;

    let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
    db.run_migrations()?;
    db.health_check()?;

    let listings = Arc::new(SqliteListingRepository::new(Arc::clone(&db)));
    let reservations = Arc::new(SqliteReservationRepository::new(Arc::clone(&db)));
    let fetcher = Arc::new(IcsFeedClient::new(Duration::from_secs(config.sync.feed_timeout_secs))?);

    let service = Arc::new(CalendarSyncService::new(listings, reservations, fetcher));

    if !config.sync.enabled {
        warn!("scheduled sync is disabled in configuration; nothing to do");
        return Ok(());
    }

    let mut scheduler = SyncScheduler::with_config(
        SyncSchedulerConfig {
            cron_expression: config.sync.cron_expression.clone(),
            ..Default::default()
        },
        Arc::clone(&service),
    )?;

    scheduler.start().await?;
    info!(cron = %config.sync.cron_expression, "roost-syncd running; press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| RoostError::Internal(format!("failed to listen for shutdown: {err}")))?;

    info!("shutdown requested");
    scheduler.stop().await?;

    Ok(())
}
