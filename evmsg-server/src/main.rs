//! Event Messenger Server
//!
//! Collects messages for an event and emails them to the recipient on the
//! event date.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use evmsg_core::artifacts::{ArtifactStore, FsArtifactStore};
use evmsg_core::config::ConfigStore;
use evmsg_core::lifecycle::EventLifecycle;
use evmsg_core::mail::{HttpMailTransport, MailTransport};
use evmsg_core::processors::{CleanupScheduler, NotificationScheduler, Notifier};
use evmsg_core::render::{MinijinjaRenderer, TemplateRenderer};
use evmsg_core::store::{EventStore, PgEventStore};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Event Messenger - collect messages and deliver them on the event date
#[derive(Parser, Debug)]
#[command(name = "evmsg-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./evmsg-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting evmsg-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.server.listen;
    let scheduler_config = ConfigStore::new(loaded_config.scheduler.clone());

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Collaborators
    let fs_artifacts = FsArtifactStore::new(&loaded_config.storage.upload_dir);
    fs_artifacts.init().await.map_err(|e| {
        tracing::error!(
            "Failed to create upload directory {:?}: {}",
            loaded_config.storage.upload_dir,
            e
        );
        e
    })?;
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(fs_artifacts);
    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(db_pool.clone()));

    let renderer = match &loaded_config.storage.email_template {
        Some(path) => {
            tracing::info!("Using email template {:?}", path);
            MinijinjaRenderer::from_path(path)
        }
        None => MinijinjaRenderer::new(),
    }
    .map_err(|e| {
        tracing::error!("Failed to load email template: {}", e);
        e
    })?;
    let renderer: Arc<dyn TemplateRenderer> = Arc::new(renderer);

    let mail = &loaded_config.mail;
    let transport: Arc<dyn MailTransport> = Arc::new(HttpMailTransport::new(
        mail.endpoint.clone(),
        mail.api_key.clone(),
        mail.from.clone(),
        mail.timeout,
    ));

    // Background loops
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let notifier = Notifier::new(
        store.clone(),
        artifacts.clone(),
        renderer,
        transport,
    );
    let notification_scheduler =
        NotificationScheduler::new(store.clone(), notifier, scheduler_config.clone());
    let cleanup_scheduler = CleanupScheduler::new(
        store.clone(),
        EventLifecycle::new(store, artifacts.clone()),
        scheduler_config.clone(),
    );

    let notification_handle = tokio::spawn(notification_scheduler.run(shutdown_rx.clone()));
    let cleanup_handle = tokio::spawn(cleanup_scheduler.run(shutdown_rx));

    let reload_notify = spawn_config_reload_handler(config_loader, scheduler_config.clone());

    let state = AppState::new(
        db_pool.clone(),
        loaded_config.server,
        scheduler_config,
        artifacts,
    );
    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the background loops; a run in progress is allowed to finish.
    tracing::info!("Stopping background tasks...");
    let _ = shutdown_tx.send(true);
    reload_notify.notify_one();
    for (name, handle) in [
        ("NotificationScheduler", notification_handle),
        ("CleanupScheduler", cleanup_handle),
    ] {
        if let Err(e) = handle.await {
            tracing::error!(task = name, error = %e, "Background task failed");
        }
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
