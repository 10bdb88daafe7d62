//! Application state shared across all request handlers.

use crate::config::runtime::ServerConfig;
use evmsg_core::artifacts::ArtifactStore;
use evmsg_core::config::{ConfigStore, SchedulerConfig};
use evmsg_core::framework::DatabaseProcessor;
use sqlx::PgPool;
use std::sync::Arc;
use time::{Date, OffsetDateTime, UtcOffset};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub server: Arc<ServerConfig>,
    /// Scheduler settings; handlers read the local offset from here.
    pub scheduler: ConfigStore<SchedulerConfig>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        server: ServerConfig,
        scheduler: ConfigStore<SchedulerConfig>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            db,
            server: Arc::new(server),
            scheduler,
            artifacts,
        }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.scheduler.snapshot().utc_offset
    }

    /// Today's local date.
    pub fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.utc_offset()).date()
    }
}
