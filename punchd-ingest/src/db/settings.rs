//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Get a typed setting value, None when the key is absent
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value_opt: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    // Unparsable stored values are treated as absent so the caller's
    // default can take over
    Ok(value_opt.and_then(|(v,)| v.parse::<T>().ok()))
}

/// Set a setting value
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value.to_string())
        .execute(db)
        .await?;
    Ok(())
}

/// Get per-record ingest timeout in milliseconds
pub async fn get_record_timeout_ms(db: &Pool<Sqlite>) -> Result<u64> {
    match get_setting::<u64>(db, "record_timeout_ms").await? {
        Some(ms) => Ok(ms),
        None => {
            set_setting(db, "record_timeout_ms", 5000u64).await?;
            Ok(5000)
        }
    }
}

/// Get subscriber fanout channel capacity
pub async fn get_event_buffer_size(db: &Pool<Sqlite>) -> Result<usize> {
    match get_setting::<usize>(db, "event_buffer_size").await? {
        Some(size) if size > 0 => Ok(size),
        _ => {
            set_setting(db, "event_buffer_size", 100usize).await?;
            Ok(100)
        }
    }
}

/// Get the device state codes that designate a check-in punch
pub async fn get_checkin_state_codes(db: &Pool<Sqlite>) -> Result<Vec<String>> {
    let raw = match get_setting::<String>(db, "checkin_state_codes").await? {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => {
            let default = "0,IN".to_string();
            set_setting(db, "checkin_state_codes", default.clone()).await?;
            default
        }
    };

    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
