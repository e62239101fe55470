//! Employee identity directory access
//!
//! Resolves a device-reported employee code to an internal identity.
//! Devices report whichever code they were enrolled with, so the lookup
//! matches across the employee number, the device user id, and the
//! biometric id. Inactive employees never resolve.

use crate::error::{Error, Result};
use punchd_common::EmployeeIdentity;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

/// Resolve a device-reported code to an employee identity
///
/// Returns `None` when no active employee matches; callers surface that
/// as a per-record `UnknownEmployee` error.
pub async fn resolve_device_code(
    db: &Pool<Sqlite>,
    code: &str,
) -> Result<Option<EmployeeIdentity>> {
    let row = sqlx::query(
        r#"
        SELECT guid, employee_id, first_name, last_name
        FROM employees
        WHERE (employee_id = ?1 OR device_user_id = ?1 OR biometric_id = ?1)
          AND is_active = 1
        "#,
    )
    .bind(code)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Malformed employee guid '{}': {}", guid_str, e)))?;
    let first_name: String = row.get("first_name");
    let last_name: String = row.get("last_name");

    Ok(Some(EmployeeIdentity {
        guid,
        employee_id: row.get("employee_id"),
        display_name: format!("{} {}", first_name, last_name),
    }))
}

/// Insert an employee row (directory administration is an external
/// collaborator concern; this exists for tests and tooling)
pub async fn insert_employee(
    db: &Pool<Sqlite>,
    guid: Uuid,
    employee_id: &str,
    device_user_id: Option<&str>,
    biometric_id: Option<&str>,
    first_name: &str,
    last_name: &str,
    is_active: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO employees
            (guid, employee_id, device_user_id, biometric_id, first_name, last_name, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(employee_id)
    .bind(device_user_id)
    .bind(biometric_id)
    .bind(first_name)
    .bind(last_name)
    .bind(is_active as i32)
    .execute(db)
    .await?;
    Ok(())
}
