//! Domain model types shared across punchd services

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a single device punch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PunchDirection {
    CheckIn,
    CheckOut,
}

impl PunchDirection {
    /// Derive the direction from a device state code.
    ///
    /// Devices report state as a number or a string; the designated
    /// check-in codes are configurable (different device firmwares use
    /// `0` or `1` for check-in). Anything else, including a missing
    /// state, is treated as check-out.
    pub fn from_state(state: Option<&serde_json::Value>, checkin_codes: &[String]) -> Self {
        let code = match state {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => return PunchDirection::CheckOut,
        };
        if checkin_codes.iter().any(|c| c.eq_ignore_ascii_case(&code)) {
            PunchDirection::CheckIn
        } else {
            PunchDirection::CheckOut
        }
    }
}

/// Derived state of a daily attendance aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    /// No punch observed yet (transient: only exists before the first merge)
    Absent,
    /// At least one punch observed, day not closed by a check-out
    Open,
    /// A check-out closed the day
    Closed,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Absent => "Absent",
            DayStatus::Open => "Open",
            DayStatus::Closed => "Closed",
        }
    }

    /// Parse from the database TEXT column
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Absent" => Some(DayStatus::Absent),
            "Open" => Some(DayStatus::Open),
            "Closed" => Some(DayStatus::Closed),
            _ => None,
        }
    }
}

/// What a merge did to the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAction {
    Created,
    Updated,
    Unchanged,
}

impl MergeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeAction::Created => "created",
            MergeAction::Updated => "updated",
            MergeAction::Unchanged => "unchanged",
        }
    }

    /// True when the merge mutated the stored aggregate
    pub fn is_mutation(&self) -> bool {
        !matches!(self, MergeAction::Unchanged)
    }
}

/// Reconciled per-employee per-day attendance aggregate
///
/// One row per `(employee, local calendar day)`. `check_in` only ever
/// moves earlier, `check_out` only ever moves later; the reconciliation
/// merge is the single writer and preserves both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub employee_id: Uuid,
    pub day: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: DayStatus,
    pub updated_at: DateTime<Utc>,
}

impl DailyAttendance {
    /// Fresh aggregate for a key that has no stored row yet
    pub fn absent(employee_id: Uuid, day: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            employee_id,
            day,
            check_in: None,
            check_out: None,
            status: DayStatus::Absent,
            updated_at: now,
        }
    }
}

/// Resolved employee identity from the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeIdentity {
    /// Internal employee identifier
    pub guid: Uuid,
    /// Human-facing employee number
    pub employee_id: String,
    /// Display name for per-record results and subscriber pushes
    pub display_name: String,
}
