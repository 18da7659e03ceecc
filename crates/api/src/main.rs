use std::time::Duration;

use affiliate_backoffice_api::{
    app::{build_router, AppState},
    config::Config,
    jobs::{AffiliateSyncJob, JobScheduler, PendingInvitesJob, PoolMetricsJob, ResultsSyncJob},
    middleware::{init_logging, init_metrics},
    partners::Partners,
    services::{bootstrap::bootstrap_admin, SyncService},
};
use anyhow::{Context, Result};
use persistence::repositories::SystemConfigRepository;
use tracing::{info, warn};

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);
    init_metrics().context("failed to install Prometheus recorder")?;

    info!("Starting affiliate back office v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    SystemConfigRepository::new(pool.clone())
        .seed_defaults()
        .await
        .context("failed to seed system configuration")?;
    bootstrap_admin(&pool, &config.bootstrap)
        .await
        .context("failed to bootstrap admin user")?;

    let partners =
        Partners::from_config(&config.partners).context("failed to build partner clients")?;
    let state = AppState::new(config.clone(), pool.clone(), partners.clone())?;

    let mut scheduler = JobScheduler::new();
    if config.jobs.enabled {
        let sync = SyncService::new(
            pool.clone(),
            partners.clone(),
            state.sync_locks.clone(),
            &config,
        );
        scheduler.register(AffiliateSyncJob::new(sync.clone()));
        scheduler.register(ResultsSyncJob::new(sync));
        scheduler.register(PendingInvitesJob::new(pool.clone(), partners));
        scheduler.register(PoolMetricsJob::new(pool.clone()));
        scheduler.start();
    } else {
        warn!("Background jobs disabled (jobs.enabled = false)");
    }

    let app = build_router(state);
    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM, waiting for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received");
}
