//! Database access layer
//!
//! Provides queries for the attendance aggregate store, the employee
//! identity directory, and the settings table.

pub mod aggregates;
pub mod employees;
pub mod init;
pub mod settings;

use crate::error::{Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open the SQLite database, creating the file if needed
pub async fn connect(database_path: &Path) -> Result<SqlitePool> {
    let db_url = format!("sqlite:{}?mode=rwc", database_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect(&db_url)
        .await
        .map_err(Error::Database)?;

    info!("Connected to database: {:?}", database_path);
    Ok(pool)
}
