//! Database initialization functions
//!
//! Creates required tables on startup and initializes missing settings
//! with built-in defaults.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Initialize settings table with default values
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing default settings");

    let defaults = vec![
        // Per-record ingest timeout
        ("record_timeout_ms", "5000"),
        // Subscriber fanout channel capacity
        ("event_buffer_size", "100"),
        // Device state codes that designate a check-in punch
        ("checkin_state_codes", "0,IN"),
    ];

    for (key, default_value) in defaults {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;

            info!(
                "Initialized setting '{}' with default value: {}",
                key, default_value
            );
        }
    }

    Ok(())
}

/// Initialize all required database structures
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database structures");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            guid TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL UNIQUE,
            device_user_id TEXT,
            biometric_id TEXT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_days (
            employee_guid TEXT NOT NULL,
            day TEXT NOT NULL,
            check_in TEXT,
            check_out TEXT,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (employee_guid, day)
        )
        "#,
    )
    .execute(pool)
    .await?;

    init_settings_defaults(pool).await?;

    info!("Database initialization complete");
    Ok(())
}
