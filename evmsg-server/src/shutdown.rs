//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use evmsg_core::config::{ConfigStore, SchedulerConfig};
use std::sync::Arc;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::Notify;

/// Wait for `kind` forever. A handler that cannot be installed never fires.
async fn wait_for(kind: SignalKind, name: &'static str) {
    let installed: std::io::Result<Signal> = signal(kind);
    match installed {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, signal = name, "Failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() {
    tokio::select! {
        _ = wait_for(SignalKind::terminate(), "SIGTERM") => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = wait_for(SignalKind::interrupt(), "SIGINT") => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// Only the `[scheduler]` section is applied live; both schedulers pick up
/// the new values on their next cycle. Other sections need a restart.
///
/// Returns a Notify that stops the handler.
pub fn spawn_config_reload_handler(
    config_loader: Arc<ConfigLoader>,
    scheduler_config: ConfigStore<SchedulerConfig>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler, config reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            let previous = scheduler_config.snapshot();
                            if *previous != loaded_config.scheduler {
                                scheduler_config.update(loaded_config.scheduler);
                                tracing::info!("Scheduler configuration reloaded");
                            } else {
                                tracing::info!("Scheduler configuration unchanged");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload configuration");
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}
