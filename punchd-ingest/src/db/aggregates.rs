//! Daily attendance aggregate store
//!
//! One row per `(employee, local calendar day)` holding the reconciled
//! earliest-check-in / latest-check-out state. Instants are stored as
//! RFC 3339 TEXT; the day key is the local calendar date.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use punchd_common::{DailyAttendance, DayStatus};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

/// Fetch the aggregate for one key, None when no punch was observed yet
pub async fn get(
    db: &Pool<Sqlite>,
    employee_guid: Uuid,
    day: NaiveDate,
) -> Result<Option<DailyAttendance>> {
    let row = sqlx::query(
        r#"
        SELECT check_in, check_out, status, updated_at
        FROM attendance_days
        WHERE employee_guid = ? AND day = ?
        "#,
    )
    .bind(employee_guid.to_string())
    .bind(day.to_string())
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let status_str: String = row.get("status");
    let status = DayStatus::parse(&status_str)
        .ok_or_else(|| Error::Internal(format!("Malformed day status '{}'", status_str)))?;

    Ok(Some(DailyAttendance {
        employee_id: employee_guid,
        day,
        check_in: parse_instant(row.get("check_in"))?,
        check_out: parse_instant(row.get("check_out"))?,
        status,
        updated_at: parse_instant(Some(row.get("updated_at")))?
            .ok_or_else(|| Error::Internal("Missing updated_at".to_string()))?,
    }))
}

/// Write the aggregate row, replacing any existing row for its key
///
/// The reconciliation engine is the only writer and holds the per-key
/// lock across its read-modify-write, so a full-row replace is safe.
pub async fn upsert(db: &Pool<Sqlite>, aggregate: &DailyAttendance) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO attendance_days
            (employee_guid, day, check_in, check_out, status, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(aggregate.employee_id.to_string())
    .bind(aggregate.day.to_string())
    .bind(aggregate.check_in.map(|t| t.to_rfc3339()))
    .bind(aggregate.check_out.map(|t| t.to_rfc3339()))
    .bind(aggregate.status.as_str())
    .bind(aggregate.updated_at.to_rfc3339())
    .execute(db)
    .await?;
    Ok(())
}

fn parse_instant(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| Error::Internal(format!("Malformed stored instant '{}': {}", s, e))),
    }
}
