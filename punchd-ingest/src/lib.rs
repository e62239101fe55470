//! # Punchd Ingest Service (punchd-ingest)
//!
//! Real-time attendance punch ingestion and reconciliation.
//!
//! **Purpose:** Receive biometric-device punch events over HTTP, merge
//! them into per-employee daily attendance aggregates with per-key
//! serialization, and push every mutation to live SSE subscribers.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fanout;
pub mod reconcile;
pub mod service;

pub use error::{Error, Result};
pub use service::{Service, ServiceStatus};
