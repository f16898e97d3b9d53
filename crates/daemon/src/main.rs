//! ClinicQ Queue Coordinator - Main Entry Point
//!
//! Composition root: wires the SQLite store, the event broker, the ingest
//! loop and the JSON-RPC server together.

mod config;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinicq_api_rpc::{RpcServer, RpcServerConfig};
use clinicq_core::application::{shutdown_channel, IngestPolicy, Ingestor, QueueService};
use clinicq_core::domain::{ClinicCalendar, SessionSet};
use clinicq_core::port::id_provider::UuidProvider;
use clinicq_core::port::notifier::BroadcastNotifier;
use clinicq_core::port::time_provider::SystemTimeProvider;
use clinicq_infra_broker::channel_broker;
use clinicq_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};
use config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NOTIFIER_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let config = Config::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("clinicq=info"))
        .expect("Failed to create env filter");

    match config.log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("ClinicQ Queue Coordinator v{} starting...", VERSION);
    info!(db_path = %config.db_path, "Initializing database...");

    // 2. Initialize database
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let tx_repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let notifier = Arc::new(BroadcastNotifier::new(NOTIFIER_CAPACITY));

    let sessions = SessionSet::new(config.sessions.clone(), config.default_session.clone())
        .map_err(|e| anyhow::anyhow!("Invalid session configuration: {}", e))?;
    let calendar = ClinicCalendar::new(config.utc_offset_minutes);
    let policy = IngestPolicy::new(sessions, calendar, config.grace_window_ms);

    let service = Arc::new(QueueService::new(
        tx_repo,
        repo,
        id_provider,
        time_provider.clone(),
        notifier,
    ));

    // 4. Wire the event broker and start the ingest loop
    //
    // The publisher end stays alive in main so the source channel never
    // closes while the daemon runs. External feeds hand events to it.
    let (publisher, source) = channel_broker(config.ingest_capacity);
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    info!("Starting event ingestor...");
    let ingestor = Ingestor::new(
        Arc::new(source),
        service.clone(),
        policy.clone(),
        time_provider.clone(),
    );

    let ingest_handle = tokio::spawn(async move {
        if let Err(e) = ingestor.run(shutdown_rx).await {
            tracing::error!(error = ?e, "Ingestor failed");
        }
    });

    // 5. Log committed queue changes as they happen
    let mut changes = service.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            info!(
                partition = %change.partition,
                entry_id = %change.entry_id,
                status = %change.status,
                "Queue change committed"
            );
        }
    });

    // 6. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
        rate_limit_burst: config.rate_limit_burst,
        rate_limit_per_sec: config.rate_limit_per_sec,
    };
    let rpc_server = RpcServer::new(rpc_config, service, policy, time_provider);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Waiting for appointment events...");
    info!("Press Ctrl+C to shutdown");

    // Hold the publisher so the ingest channel stays open
    let _publisher = publisher;

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: stop intake first so in-flight events drain
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), ingest_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
