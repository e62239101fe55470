//! Integration tests for the attendance ingest API
//!
//! Drives the full handler path: JSON body → identity resolution →
//! timestamp normalization → reconciliation → per-record results.

mod helpers;

use axum::http::StatusCode;
use chrono::NaiveDate;
use helpers::{make_request, setup};
use punchd_common::{DayStatus, LocalDayPolicy};
use punchd_ingest::db;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_reports_running() {
    let app = setup(LocalDayPolicy::utc()).await;

    let (status, body) = make_request(&app.router, "GET", "/attendance/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "running");
    assert_eq!(body["subscriberCount"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn single_punch_creates_aggregate() {
    let app = setup(LocalDayPolicy::utc()).await;

    let record = json!({
        "deviceUserId": "101",
        "recordTime": "2025-03-10T09:05:00Z",
        "state": 0
    });
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["created"], 1);
    let result = &body["results"][0];
    assert_eq!(result["success"], true);
    assert_eq!(result["action"], "created");
    assert_eq!(result["employeeId"], "101");
    assert_eq!(result["employeeName"], "Ayesha Khan");
    assert_eq!(result["timestamp"], "2025-03-10 09:05:00");
    assert_eq!(result["aggregate"]["status"], "Open");

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let stored = db::aggregates::get(&app.db, app.emp1, day)
        .await
        .unwrap()
        .expect("aggregate row must exist");
    assert_eq!(stored.status, DayStatus::Open);
    assert!(stored.check_in.is_some());
    assert!(stored.check_out.is_none());
}

#[tokio::test]
async fn earliest_in_latest_out_scenario() {
    let app = setup(LocalDayPolicy::utc()).await;

    // Out-of-order arrivals: a later check-in first, then the real
    // earliest, then the check-out
    let punches = [
        (json!({"deviceUserId": "101", "recordTime": "2025-03-10T09:05:00Z", "state": 0}), "created"),
        (json!({"deviceUserId": "101", "recordTime": "2025-03-10T09:00:00Z", "state": 0}), "updated"),
        (json!({"deviceUserId": "101", "recordTime": "2025-03-10T17:30:00Z", "state": 1}), "updated"),
    ];
    for (record, expected_action) in punches {
        let (status, body) =
            make_request(&app.router, "POST", "/attendance/push", Some(record)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["results"][0]["action"], expected_action);
    }

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let stored = db::aggregates::get(&app.db, app.emp1, day)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.check_in.unwrap().to_rfc3339(), "2025-03-10T09:00:00+00:00");
    assert_eq!(stored.check_out.unwrap().to_rfc3339(), "2025-03-10T17:30:00+00:00");
    assert_eq!(stored.status, DayStatus::Closed);
}

#[tokio::test]
async fn replayed_punch_is_unchanged() {
    let app = setup(LocalDayPolicy::utc()).await;
    let record = json!({
        "deviceUserId": "101",
        "recordTime": "2025-03-10T09:00:00Z",
        "state": 0
    });

    let (_, first) =
        make_request(&app.router, "POST", "/attendance/push", Some(record.clone())).await;
    let first = first.unwrap();
    assert_eq!(first["results"][0]["action"], "created");

    let (_, second) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;
    let second = second.unwrap();
    assert_eq!(second["results"][0]["action"], "unchanged");
    assert_eq!(second["unchanged"], 1);

    // The aggregate, updated_at included, is byte-identical on replay
    assert_eq!(
        first["results"][0]["aggregate"],
        second["results"][0]["aggregate"]
    );
}

#[tokio::test]
async fn lone_check_out_records_single_punch_day() {
    let app = setup(LocalDayPolicy::utc()).await;

    let record = json!({
        "deviceUserId": "102",
        "recordTime": "2025-03-10T08:15:00Z",
        "state": 1
    });
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;

    assert_eq!(status, StatusCode::OK);
    let aggregate = &body.unwrap()["results"][0]["aggregate"];
    assert_eq!(aggregate["checkIn"], aggregate["checkOut"]);
    assert_eq!(aggregate["status"], "Open");
}

#[tokio::test]
async fn batch_partial_failure_is_isolated() {
    let app = setup(LocalDayPolicy::utc()).await;

    let batch = json!([
        {"deviceUserId": "101", "recordTime": "2025-03-10T09:00:00Z", "state": 0},
        {"deviceUserId": "999", "recordTime": "2025-03-10T09:00:00Z", "state": 0},
        {"deviceUserId": "102", "recordTime": "2025-03-10T09:01:00Z", "state": 0}
    ]);
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(batch)).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 2);
    assert_eq!(body["errors"], 1);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["errorKind"], "UnknownEmployee");
    assert_eq!(results[2]["success"], true);
}

#[tokio::test]
async fn invalid_timestamp_is_per_record_error() {
    let app = setup(LocalDayPolicy::utc()).await;

    let batch = json!([
        {"deviceUserId": "101", "recordTime": "not-a-time", "state": 0},
        {"deviceUserId": "102", "recordTime": "2025-03-10T09:00:00Z", "state": 0}
    ]);
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(batch)).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["results"][0]["success"], false);
    assert_eq!(body["results"][0]["errorKind"], "InvalidTimestamp");
    assert_eq!(body["results"][1]["success"], true);
}

#[tokio::test]
async fn missing_fields_fail_only_their_record() {
    let app = setup(LocalDayPolicy::utc()).await;

    let batch = json!([
        {},
        {"deviceUserId": "101"},
        {"deviceUserId": "101", "recordTime": "2025-03-10T09:00:00Z", "state": 0}
    ]);
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(batch)).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["results"][0]["success"], false);
    assert_eq!(body["results"][1]["success"], false);
    assert_eq!(body["results"][1]["errorKind"], "InvalidTimestamp");
    assert_eq!(body["results"][2]["success"], true);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["errors"], 2);
}

#[tokio::test]
async fn inactive_employee_does_not_resolve() {
    let app = setup(LocalDayPolicy::utc()).await;

    let record = json!({
        "deviceUserId": "109",
        "recordTime": "2025-03-10T09:00:00Z",
        "state": 0
    });
    let (_, body) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;
    assert_eq!(body.unwrap()["results"][0]["errorKind"], "UnknownEmployee");
}

#[tokio::test]
async fn alternate_code_and_field_aliases_resolve() {
    let app = setup(LocalDayPolicy::utc()).await;

    // Biometric id through the `uid` alias, epoch timestamp
    let record = json!({
        "uid": "BIO-2",
        "timestamp": 1741600800,
        "state": "IN"
    });
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["results"][0]["success"], true);
    assert_eq!(body["results"][0]["employeeName"], "Bilal Raza");
}

#[tokio::test]
async fn naive_timestamps_key_to_the_local_day() {
    // Deployment zone UTC+5: 02:00 local on March 11 is 21:00 UTC on
    // March 10, and must still land on the March 11 aggregate
    let app = setup(LocalDayPolicy::parse("+05:00").unwrap()).await;

    let record = json!({
        "deviceUserId": "101",
        "recordTime": "2025-03-11 02:00:00",
        "state": 0
    });
    let (status, body) = make_request(&app.router, "POST", "/attendance/push", Some(record)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["results"][0]["aggregate"]["day"], "2025-03-11");

    let local_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let utc_day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    assert!(db::aggregates::get(&app.db, app.emp1, local_day)
        .await
        .unwrap()
        .is_some());
    assert!(db::aggregates::get(&app.db, app.emp1, utc_day)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn punches_on_different_days_key_separately() {
    let app = setup(LocalDayPolicy::utc()).await;

    for record in [
        json!({"deviceUserId": "101", "recordTime": "2025-03-10T09:00:00Z", "state": 0}),
        json!({"deviceUserId": "101", "recordTime": "2025-03-11T09:00:00Z", "state": 0}),
    ] {
        let (status, _) =
            make_request(&app.router, "POST", "/attendance/push", Some(record)).await;
        assert_eq!(status, StatusCode::OK);
    }

    for day in [
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
    ] {
        let stored = db::aggregates::get(&app.db, app.emp1, day).await.unwrap();
        assert!(stored.is_some(), "expected an aggregate for {}", day);
    }
}
