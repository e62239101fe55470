//! HTTP request handlers
//!
//! The push endpoint processes each record of a batch independently:
//! one bad record yields one failed result entry and never aborts its
//! siblings. The endpoint itself answers 200 with per-record outcomes;
//! the only batch-level failure is a totally unreachable store, which
//! answers 503 with a retryable flag.

use crate::api::AppContext;
use crate::db;
use crate::error::{Error, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use punchd_common::events::AttendanceUpdate;
use punchd_common::{time, DailyAttendance, MergeAction, PunchDirection};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

// ============================================================================
// Response Types
// ============================================================================

/// Outcome of one record in a push batch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<MergeAction>,
    /// Device-reported employee code, echoed back when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    /// Punch time rendered in the deployment-local zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<DailyAttendance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordResult {
    fn failure(employee_id: Option<String>, err: &Error) -> Self {
        Self {
            success: false,
            action: None,
            employee_id,
            employee_name: None,
            timestamp: None,
            aggregate: None,
            error_kind: Some(err.kind().to_string()),
            error: Some(err.to_string()),
        }
    }
}

/// Batch-level push response
#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub success: bool,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
    pub results: Vec<RecordResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub subscriber_count: usize,
}

// ============================================================================
// Push Endpoint
// ============================================================================

/// POST /attendance/push - ingest one punch event or an array of them
pub async fn push(State(ctx): State<AppContext>, Json(body): Json<Value>) -> Response {
    let records = match body {
        Value::Array(items) => items,
        single => vec![single],
    };
    info!("Received {} punch record(s)", records.len());

    let timeout = ctx.settings.record_timeout();
    let results = futures::future::join_all(
        records
            .iter()
            .map(|record| process_record(&ctx, record, timeout)),
    )
    .await;

    // A store outage across the whole batch is a retryable transport-level
    // failure, not something to bury in per-record results
    let store_down = !results.is_empty()
        && results
            .iter()
            .all(|r| r.error_kind.as_deref() == Some("StoreUnavailable"));
    if store_down {
        warn!("Attendance store unreachable, failing batch as retryable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "attendance store unavailable",
                "retryable": true,
            })),
        )
            .into_response();
    }

    let processed = results.iter().filter(|r| r.success).count();
    let count = |action: MergeAction| {
        results
            .iter()
            .filter(|r| r.action == Some(action))
            .count()
    };
    let response = PushResponse {
        success: true,
        processed,
        created: count(MergeAction::Created),
        updated: count(MergeAction::Updated),
        unchanged: count(MergeAction::Unchanged),
        errors: results.len() - processed,
        results,
    };
    info!(
        "Push complete: {} processed, {} created, {} updated, {} unchanged, {} errors",
        response.processed, response.created, response.updated, response.unchanged, response.errors
    );

    (StatusCode::OK, Json(response)).into_response()
}

/// Process one record, bounded by the configured per-record timeout
async fn process_record(ctx: &AppContext, record: &Value, timeout: Duration) -> RecordResult {
    let device_code = extract_device_code(record);

    match tokio::time::timeout(timeout, process_record_inner(ctx, record, device_code.as_deref()))
        .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!("Punch record failed ({}): {}", err.kind(), err);
            RecordResult::failure(device_code, &err)
        }
        Err(_) => {
            let err = Error::Timeout(format!(
                "record processing exceeded {} ms",
                timeout.as_millis()
            ));
            warn!("{}", err);
            RecordResult::failure(device_code, &err)
        }
    }
}

async fn process_record_inner(
    ctx: &AppContext,
    record: &Value,
    device_code: Option<&str>,
) -> Result<RecordResult> {
    let code = device_code
        .ok_or_else(|| Error::UnknownEmployee("record carries no device user id".to_string()))?;

    let raw_timestamp = record
        .get("recordTime")
        .or_else(|| record.get("timestamp"))
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            punchd_common::Error::InvalidTimestamp("record carries no timestamp".to_string())
        })?;
    let instant = time::normalize_value(raw_timestamp, ctx.reconciler.policy())?;

    let employee = db::employees::resolve_device_code(&ctx.db, code)
        .await?
        .ok_or_else(|| Error::UnknownEmployee(code.to_string()))?;

    let direction = PunchDirection::from_state(record.get("state"), &ctx.settings.checkin_state_codes);
    let (aggregate, action) = ctx.reconciler.reconcile(employee.guid, instant, direction).await?;
    let local_timestamp = ctx.reconciler.policy().format_local(instant);

    // Fire-and-forget: the caller's response never waits on delivery
    if action.is_mutation() {
        ctx.fanout.publish(AttendanceUpdate {
            action,
            employee_id: employee.employee_id.clone(),
            employee_name: employee.display_name.clone(),
            timestamp: local_timestamp.clone(),
            aggregate: aggregate.clone(),
        });
    }

    info!(
        "Punch {}: {} ({}) {:?} at {}",
        action.as_str(),
        employee.display_name,
        employee.employee_id,
        direction,
        local_timestamp
    );

    Ok(RecordResult {
        success: true,
        action: Some(action),
        employee_id: Some(code.to_string()),
        employee_name: Some(employee.display_name),
        timestamp: Some(local_timestamp),
        aggregate: Some(aggregate),
        error_kind: None,
        error: None,
    })
}

/// Extract the device-reported employee code from any of its aliases
fn extract_device_code(record: &Value) -> Option<String> {
    for key in ["deviceUserId", "uid", "userId"] {
        match record.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /attendance/health - health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "running".to_string(),
        timestamp: time::now(),
        subscriber_count: ctx.fanout.subscriber_count(),
    })
}
