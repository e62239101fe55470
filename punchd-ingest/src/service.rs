//! Service lifecycle controller
//!
//! Owns the HTTP listener and the subscriber fanout. `start` and `stop`
//! are idempotent; a failed bind leaves nothing running. The fanout and
//! reconciler are constructed per run, only after the listener bound
//! successfully, so a bind failure cannot leak subscriber infrastructure.

use crate::api::{self, AppContext};
use crate::config::RuntimeSettings;
use crate::error::{Error, Result};
use crate::fanout::Fanout;
use crate::reconcile::Reconciler;
use punchd_common::LocalDayPolicy;
use serde::Serialize;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Snapshot of the service state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub running: bool,
    pub subscriber_count: usize,
    pub endpoint_addr: Option<SocketAddr>,
}

/// State held only while the listener is up
struct RunningServer {
    addr: SocketAddr,
    fanout: Fanout,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Attendance ingest service instance
///
/// Explicitly constructed with its dependencies (database pool, local-day
/// policy, runtime settings) so tests can run multiple independent
/// instances side by side.
pub struct Service {
    db: SqlitePool,
    policy: LocalDayPolicy,
    settings: RuntimeSettings,
    port: u16,
    running: Mutex<Option<RunningServer>>,
}

impl Service {
    /// Create a stopped service instance; `port` 0 binds an ephemeral port
    pub fn new(db: SqlitePool, policy: LocalDayPolicy, settings: RuntimeSettings, port: u16) -> Self {
        Self {
            db,
            policy,
            settings,
            port,
            running: Mutex::new(None),
        }
    }

    /// Start the listener and subscriber fanout
    ///
    /// Idempotent: starting an already-running service reports success
    /// without creating a second listener.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut running = self.running.lock().await;
        if let Some(run) = running.as_ref() {
            info!("Ingest service already running on {}", run.addr);
            return Ok(run.addr);
        }

        let bind_addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| Error::ListenerBind(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::ListenerBind(format!("Failed to read bound address: {}", e)))?;

        // Subscriber infrastructure is created only after a successful bind
        let fanout = Fanout::new(self.settings.event_buffer_size);
        let ctx = AppContext {
            db: self.db.clone(),
            fanout: fanout.clone(),
            reconciler: Arc::new(Reconciler::new(self.db.clone(), self.policy)),
            settings: self.settings.clone(),
        };
        let app = api::create_router(ctx);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        });

        info!("Ingest service listening on {}", addr);
        *running = Some(RunningServer {
            addr,
            fanout,
            shutdown_tx,
            handle,
        });
        Ok(addr)
    }

    /// Stop the listener and close all subscriber connections
    ///
    /// Idempotent: stopping a stopped service is a no-op.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(run) = running.take() else {
            info!("Ingest service already stopped");
            return;
        };

        // Close subscriber streams first so graceful shutdown is not
        // held open by long-lived SSE connections
        run.fanout.shutdown();
        let _ = run.shutdown_tx.send(());
        if let Err(e) = run.handle.await {
            error!("Server task join error: {}", e);
        }
        info!("Ingest service stopped");
    }

    /// Current service status
    pub async fn status(&self) -> ServiceStatus {
        let running = self.running.lock().await;
        match running.as_ref() {
            Some(run) => ServiceStatus {
                running: true,
                subscriber_count: run.fanout.subscriber_count(),
                endpoint_addr: Some(run.addr),
            },
            None => ServiceStatus {
                running: false,
                subscriber_count: 0,
                endpoint_addr: None,
            },
        }
    }
}
