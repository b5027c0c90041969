//! Persistence wiring: which store backs the API.

use std::sync::Arc;

use anyhow::Context;

use tabs_infra::{AppConfig, InMemoryTimesheetStore, PostgresTimesheetStore, TimesheetStore, db};

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn TimesheetStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn TimesheetStore>) -> Self {
        Self { store }
    }

    /// Empty process-local store (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTimesheetStore::new()))
    }

    pub fn store(&self) -> &dyn TimesheetStore {
        self.store.as_ref()
    }
}

/// Postgres when `DATABASE_URL` is configured, otherwise in-memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
        return Ok(AppServices::in_memory());
    };

    let pool = db::connect(database_url, config.db_max_connections)
        .await
        .context("failed to connect to Postgres")?;
    db::migrate(&pool).await.context("failed to migrate schema")?;

    tracing::info!(max_connections = config.db_max_connections, "using Postgres store");
    Ok(AppServices::new(Arc::new(PostgresTimesheetStore::new(pool))))
}
