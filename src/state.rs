use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::db::Database;

/// Shared application context handed to every handler through axum `State`.
pub struct AppState {
    pub config: Config,
    pub db: Database,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Builds the connection pool from the already-resolved credentials.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let db = Database::connect(&config.database)
            .context("Failed to create database pool")?;

        Ok(AppState { config, db })
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }
}
