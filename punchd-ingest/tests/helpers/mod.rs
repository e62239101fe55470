//! Test helpers for integration tests
//!
//! Builds a programmatically controllable ingest app with an in-memory
//! database, seeded employees, and a handle on the fanout for event
//! assertions.

use axum::http::StatusCode;
use punchd_common::LocalDayPolicy;
use punchd_ingest::api::{create_router, AppContext};
use punchd_ingest::config::RuntimeSettings;
use punchd_ingest::db;
use punchd_ingest::fanout::Fanout;
use punchd_ingest::reconcile::Reconciler;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Test app with full API surface and direct component handles
pub struct TestApp {
    pub router: axum::Router,
    pub db: SqlitePool,
    pub fanout: Fanout,
    pub reconciler: Arc<Reconciler>,
    /// Seeded active employee "E1" (device user id "101")
    pub emp1: Uuid,
    /// Seeded active employee "E2" (device user id "102", biometric id "BIO-2")
    pub emp2: Uuid,
}

/// Build a test app with an in-memory database and seeded directory
pub async fn setup(policy: LocalDayPolicy) -> TestApp {
    // Single connection: every in-memory SQLite connection is its own
    // database, so the pool must not open a second one
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::init::initialize_database(&db)
        .await
        .expect("Failed to initialize schema");

    let emp1 = Uuid::new_v4();
    let emp2 = Uuid::new_v4();
    db::employees::insert_employee(&db, emp1, "E1", Some("101"), None, "Ayesha", "Khan", true)
        .await
        .expect("Failed to seed employee");
    db::employees::insert_employee(
        &db,
        emp2,
        "E2",
        Some("102"),
        Some("BIO-2"),
        "Bilal",
        "Raza",
        true,
    )
    .await
    .expect("Failed to seed employee");
    // A departed employee whose codes must no longer resolve
    db::employees::insert_employee(
        &db,
        Uuid::new_v4(),
        "E9",
        Some("109"),
        None,
        "Former",
        "Staff",
        false,
    )
    .await
    .expect("Failed to seed employee");

    let settings = RuntimeSettings::default();
    let fanout = Fanout::new(settings.event_buffer_size);
    let reconciler = Arc::new(Reconciler::new(db.clone(), policy));
    let ctx = AppContext {
        db: db.clone(),
        fanout: fanout.clone(),
        reconciler: Arc::clone(&reconciler),
        settings,
    };

    TestApp {
        router: create_router(ctx),
        db,
        fanout,
        reconciler,
        emp1,
        emp2,
    }
}

/// Make an HTTP request against the test router
pub async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        _ => panic!("Unsupported method"),
    };

    let mut request = Request::builder().method(method).uri(path);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = match body {
        Some(json_body) => request.body(Body::from(json_body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };

    (status, json_body)
}
