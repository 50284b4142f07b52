use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

use crate::config::Config;
use crate::store::{HrStore, MemoryStore, MySqlStore};

pub const MEMORY_URL: &str = "memory://";

/// Connects the store named by `DATABASE_URL` and makes sure its indexes exist.
pub async fn init_db(config: &Config) -> Result<Arc<dyn HrStore>> {
    let store: Arc<dyn HrStore> = if config.database_url.starts_with(MEMORY_URL) {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        info!("Connected to MySQL");
        Arc::new(MySqlStore::new(pool))
    };

    store
        .ensure_indexes()
        .await
        .context("Failed to create indexes")?;

    Ok(store)
}
