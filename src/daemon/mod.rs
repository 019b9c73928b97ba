//! Daemon module for the alarm coordinator service.
//!
//! This module contains the server side:
//! - `coordinator`: per-device alarm handshake state
//! - `store`: device config and log stores
//! - `http`: axum router, request handler and server

pub mod coordinator;
pub mod http;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

pub use coordinator::{log_events, AlarmCoordinator, AlarmEvent};
pub use http::{ApiError, HttpServer, RequestHandler, ServerConfig};
pub use store::{ConfigStore, InMemoryConfigStore, InMemoryLogStore, LogStore, StoreError};

/// Binds the configured address and runs the service until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = HttpServer::bind(config.bind).await?;
    run_on(server, &config.service_name, shutdown).await
}

/// Runs the service on an already bound server until `shutdown` resolves.
///
/// Wires a coordinator with event auditing, in-memory stores and the HTTP
/// server. Returns once the server has drained and the audit task has seen
/// every event.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn run_on<F>(server: HttpServer, service_name: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let audit = tokio::spawn(log_events(event_rx));

    let coordinator = Arc::new(AlarmCoordinator::with_events(event_tx));
    let handler =
        Arc::new(RequestHandler::with_coordinator(coordinator).with_service_name(service_name));

    tracing::info!(
        service = service_name,
        addr = %server.local_addr(),
        "alarm coordinator started"
    );

    let served = server.serve(handler, shutdown).await;

    // The server held the last handle to the coordinator, so the event
    // channel is closed once it returns.
    match audit.await {
        Ok(seen) => tracing::info!(events = seen, "alarm coordinator stopped"),
        Err(e) => tracing::warn!("alarm event logger ended abnormally: {}", e),
    }

    served
}

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
