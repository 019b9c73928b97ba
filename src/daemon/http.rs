//! HTTP server for the alarm coordinator.
//!
//! This module provides the service's HTTP surface:
//! - Server that listens on a TCP socket
//! - Request handling for alarm, config and log endpoints
//! - JSON response envelope and error mapping

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::types::{
    validate_device_id, AlarmCommand, AlarmState, ApiResponse, ConfigUpdate, DeviceConfig,
    DeviceIdError, HealthStatus, LogEntry, LogQuery, NewLogEntry,
};

use super::coordinator::AlarmCoordinator;
use super::store::{
    ConfigStore, ConfigWrite, InMemoryConfigStore, InMemoryLogStore, LogStore, StoreError,
};

// ============================================================================
// Constants
// ============================================================================

/// Default port, matching what deployed devices are flashed with.
pub const DEFAULT_PORT: u16 = 3001;

/// Default service name reported by the health endpoint.
pub const DEFAULT_SERVICE_NAME: &str = "despertador";

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================================================
// ServerConfig
// ============================================================================

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,
    /// Name reported by `/health`
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on `bind`.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }
}

// ============================================================================
// ApiError
// ============================================================================

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Device identifier failed transport validation
    #[error("invalid device id: {0}")]
    InvalidDeviceId(#[from] DeviceIdError),

    /// Store rejected the request
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body or query could not be parsed
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No route matched
    #[error("endpoint not found")]
    NotFound,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidDeviceId(_) | ApiError::Store(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Alarm endpoint requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmRequest {
    /// Read the current state
    Status,
    /// Apply a handshake transition
    Command(AlarmCommand),
}

/// Handles requests by dispatching to the coordinator and stores.
pub struct RequestHandler {
    /// Shared alarm coordinator
    coordinator: Arc<AlarmCoordinator>,
    /// Device config store
    configs: Arc<dyn ConfigStore>,
    /// Device log store
    logs: Arc<dyn LogStore>,
    /// Name reported by `/health`
    service_name: String,
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("coordinator", &self.coordinator)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

impl RequestHandler {
    /// Creates a handler over the given coordinator and stores.
    pub fn new(
        coordinator: Arc<AlarmCoordinator>,
        configs: Arc<dyn ConfigStore>,
        logs: Arc<dyn LogStore>,
    ) -> Self {
        Self {
            coordinator,
            configs,
            logs,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    /// Creates a handler with a fresh coordinator and in-memory stores.
    pub fn in_memory() -> Self {
        Self::with_coordinator(Arc::new(AlarmCoordinator::new()))
    }

    /// Creates a handler with in-memory stores around an existing coordinator.
    pub fn with_coordinator(coordinator: Arc<AlarmCoordinator>) -> Self {
        Self::new(
            coordinator,
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(InMemoryLogStore::new()),
        )
    }

    /// Sets the service name reported by `/health`.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    /// Returns the coordinator behind this handler.
    pub fn coordinator(&self) -> &Arc<AlarmCoordinator> {
        &self.coordinator
    }

    /// Handles an alarm request for a device.
    ///
    /// # Errors
    ///
    /// Returns an error only if the device identifier is malformed.
    pub fn handle(
        &self,
        device_id: &str,
        request: AlarmRequest,
    ) -> Result<ApiResponse<AlarmState>, ApiError> {
        let device_id = validate_device_id(device_id)?;

        let response = match request {
            AlarmRequest::Status => ApiResponse::data(self.coordinator.status(device_id)),
            AlarmRequest::Command(command) => {
                let state = self.coordinator.apply(device_id, command);
                ApiResponse::success(command_message(command), state)
            }
        };
        Ok(response)
    }

    /// Returns the health payload.
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            service: self.service_name.clone(),
            timestamp: Utc::now(),
            devices: self.coordinator.device_count(),
        }
    }

    /// Returns a device's config, creating the default on first read.
    pub fn get_config(&self, device_id: &str) -> Result<ApiResponse<DeviceConfig>, ApiError> {
        let device_id = validate_device_id(device_id)?;
        Ok(ApiResponse::data(self.configs.get(device_id)?))
    }

    /// Applies a partial config update.
    pub fn update_config(
        &self,
        device_id: &str,
        update: ConfigUpdate,
    ) -> Result<ApiResponse<DeviceConfig>, ApiError> {
        let device_id = validate_device_id(device_id)?;
        let (config, write) = self.configs.update(device_id, update)?;

        let message = match write {
            ConfigWrite::Created => "configuration created",
            ConfigWrite::Updated => "configuration updated",
        };
        Ok(ApiResponse::success(message, config))
    }

    /// Stores a device log entry.
    pub fn append_log(&self, entry: NewLogEntry) -> Result<ApiResponse<LogEntry>, ApiError> {
        if let Some(device_id) = entry.device_id.as_deref() {
            if !device_id.trim().is_empty() {
                validate_device_id(device_id)?;
            }
        }
        let stored = self.logs.append(entry)?;
        Ok(ApiResponse::success("log recorded", stored))
    }

    /// Lists log entries, newest first.
    pub fn list_logs(
        &self,
        device_id: Option<&str>,
        query: LogQuery,
    ) -> Result<ApiResponse<Vec<LogEntry>>, ApiError> {
        let device_id = device_id.map(validate_device_id).transpose()?;
        Ok(ApiResponse::list(self.logs.list(device_id, query)))
    }
}

fn command_message(command: AlarmCommand) -> &'static str {
    match command {
        AlarmCommand::Trigger => "alarm registered as ringing",
        AlarmCommand::RequestStop => "alarm will be stopped",
        AlarmCommand::Acknowledge => "alarm confirmed as stopped",
    }
}

// ============================================================================
// Router
// ============================================================================

type AppState = Arc<RequestHandler>;

/// Builds the service router.
///
/// A wrong method on a known path gets the same 404 envelope as an unknown
/// path.
pub fn router(handler: Arc<RequestHandler>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route(
            "/api/alarm/:device_id/status",
            get(alarm_status).fallback(not_found),
        )
        .route(
            "/api/alarm/:device_id/trigger",
            post(alarm_trigger).fallback(not_found),
        )
        .route(
            "/api/alarm/:device_id/stop",
            post(alarm_stop).fallback(not_found),
        )
        .route(
            "/api/alarm/:device_id/ack",
            post(alarm_ack).fallback(not_found),
        )
        .route(
            "/api/config/:device_id",
            get(get_config).put(put_config).fallback(not_found),
        )
        .route(
            "/api/logs",
            get(list_logs).post(create_log).fallback(not_found),
        )
        .route(
            "/api/logs/:device_id",
            get(list_device_logs).fallback(not_found),
        )
        .fallback(not_found)
        .layer(cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(handler)
}

/// Any origin may call the API; the app runs on the owner's phone.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn log_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    tracing::info!(
        %request_id,
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "request"
    );
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn health(State(handler): State<AppState>) -> Json<HealthStatus> {
    Json(handler.health())
}

async fn alarm_status(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<AlarmState>>, ApiError> {
    handler.handle(&device_id, AlarmRequest::Status).map(Json)
}

async fn alarm_trigger(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<AlarmState>>, ApiError> {
    handler
        .handle(&device_id, AlarmRequest::Command(AlarmCommand::Trigger))
        .map(Json)
}

async fn alarm_stop(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<AlarmState>>, ApiError> {
    handler
        .handle(&device_id, AlarmRequest::Command(AlarmCommand::RequestStop))
        .map(Json)
}

async fn alarm_ack(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<AlarmState>>, ApiError> {
    handler
        .handle(&device_id, AlarmRequest::Command(AlarmCommand::Acknowledge))
        .map(Json)
}

async fn get_config(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<DeviceConfig>>, ApiError> {
    handler.get_config(&device_id).map(Json)
}

async fn put_config(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<DeviceConfig>>, ApiError> {
    let Json(update) = payload?;
    handler.update_config(&device_id, update).map(Json)
}

async fn create_log(
    State(handler): State<AppState>,
    payload: Result<Json<NewLogEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LogEntry>>), ApiError> {
    let Json(entry) = payload?;
    let response = handler.append_log(entry)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_logs(
    State(handler): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let Query(query) = query?;
    handler.list_logs(None, query).map(Json)
}

async fn list_device_logs(
    State(handler): State<AppState>,
    Path(device_id): Path<String>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let Query(query) = query?;
    handler.list_logs(Some(&device_id), query).map(Json)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// HttpServer
// ============================================================================

/// TCP listener serving the alarm coordinator over HTTP.
#[derive(Debug)]
pub struct HttpServer {
    /// Bound listener
    listener: TcpListener,
    /// Actual bound address (resolves port 0)
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Binds a server to the given address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read bound address")?;

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while accepting connections.
    pub async fn serve<F>(self, handler: Arc<RequestHandler>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %self.local_addr, "HTTP server listening");
        axum::serve(self.listener, router(handler))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}

// ============================================================================
// Tests
// ============================================================================
