//! HTTP client for the alarm coordinator.
//!
//! This module provides:
//! - Typed calls for alarm, config and log endpoints
//! - Connection retry logic
//! - Timeout handling
//! - The device-side poll loop (`watch`)
//!
//! Requests go through a blocking `ureq` agent on tokio's blocking pool.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::{
    AlarmState, ApiResponse, ConfigUpdate, DeviceConfig, HealthStatus, LogEntry, LogQuery,
    NewLogEntry,
};

// ============================================================================
// Constants
// ============================================================================

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (1MB)
const MAX_RESPONSE_SIZE: u64 = 1024 * 1024;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// ClientError
// ============================================================================

/// Errors returned by [`AlarmClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Server URL could not be parsed
    #[error("invalid server URL '{0}': expected http://host[:port][/prefix]")]
    InvalidUrl(String),

    /// TCP connection could not be established
    #[error("cannot connect to {addr}: {reason}. Is 'despertador serve' running?")]
    Connect {
        /// Address that was dialed
        addr: String,
        /// Underlying cause
        reason: String,
    },

    /// Request or response I/O did not finish in time
    #[error("request to {0} timed out")]
    Timeout(String),

    /// HTTP-level failure after the connection was established
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Response body could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response was not the expected JSON
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Server answered with `success: false`
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error reported by the server
        message: String,
    },
}

impl ClientError {
    /// Returns true if the request never reached the server.
    ///
    /// Only these errors are retried, so non-idempotent requests such as log
    /// appends are never sent twice.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

// ============================================================================
// PollOutcome
// ============================================================================

/// What a single device poll observed and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing ringing, nothing pending
    Idle,
    /// Alarm is ringing and nobody asked to stop it
    Ringing,
    /// A stop request was seen and acknowledged
    Acknowledged,
}

// ============================================================================
// AlarmClient
// ============================================================================

/// HTTP client for the alarm coordinator.
#[derive(Clone)]
pub struct AlarmClient {
    /// Server URL every endpoint is joined onto
    base: Url,
    /// Shared HTTP agent
    agent: ureq::Agent,
}

impl fmt::Debug for AlarmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlarmClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl AlarmClient {
    /// Creates a client for the default server URL.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_server_url(DEFAULT_SERVER_URL)
    }

    /// Creates a client for a custom server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an `http://` or `https://` URL with
    /// a host, or carries a query or fragment.
    pub fn with_server_url(server_url: &str) -> Result<Self, ClientError> {
        let invalid = || ClientError::InvalidUrl(server_url.to_string());

        let base = Url::parse(server_url.trim()).map_err(|_| invalid())?;
        if !matches!(base.scheme(), "http" | "https")
            || base.cannot_be_a_base()
            || base.host_str().is_none()
            || base.query().is_some()
            || base.fragment().is_some()
        {
            return Err(invalid());
        }

        Ok(Self {
            base,
            agent: build_agent(),
        })
    }

    /// Returns the `host:port` this client dials.
    pub fn authority(&self) -> String {
        authority_of(&self.base)
    }

    /// Reports that the device's alarm started ringing.
    pub async fn trigger(&self, device_id: &str) -> Result<ApiResponse<AlarmState>, ClientError> {
        self.alarm("POST", device_id, "trigger").await
    }

    /// Asks the device to stop ringing.
    pub async fn request_stop(
        &self,
        device_id: &str,
    ) -> Result<ApiResponse<AlarmState>, ClientError> {
        self.alarm("POST", device_id, "stop").await
    }

    /// Confirms that the device stopped ringing.
    pub async fn acknowledge(
        &self,
        device_id: &str,
    ) -> Result<ApiResponse<AlarmState>, ClientError> {
        self.alarm("POST", device_id, "ack").await
    }

    /// Reads the device's alarm state.
    pub async fn status(&self, device_id: &str) -> Result<ApiResponse<AlarmState>, ClientError> {
        self.alarm("GET", device_id, "status").await
    }

    /// Queries the health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.endpoint(&["health"])?;
        let (status, body) = self.send_request_with_retry("GET", url, None).await?;
        if status != 200 {
            return Err(ClientError::Server {
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// Reads the device's configuration.
    pub async fn get_config(
        &self,
        device_id: &str,
    ) -> Result<ApiResponse<DeviceConfig>, ClientError> {
        let url = self.endpoint(&["api", "config", device_id])?;
        self.call("GET", url, None::<&()>).await
    }

    /// Applies a partial configuration update.
    pub async fn update_config(
        &self,
        device_id: &str,
        update: &ConfigUpdate,
    ) -> Result<ApiResponse<DeviceConfig>, ClientError> {
        let url = self.endpoint(&["api", "config", device_id])?;
        self.call("PUT", url, Some(update)).await
    }

    /// Appends a device log entry.
    pub async fn append_log(
        &self,
        entry: &NewLogEntry,
    ) -> Result<ApiResponse<LogEntry>, ClientError> {
        let url = self.endpoint(&["api", "logs"])?;
        self.call("POST", url, Some(entry)).await
    }

    /// Lists log entries, optionally for one device.
    pub async fn list_logs(
        &self,
        device_id: Option<&str>,
        query: LogQuery,
    ) -> Result<ApiResponse<Vec<LogEntry>>, ClientError> {
        let mut url = match device_id {
            Some(id) => self.endpoint(&["api", "logs", id])?,
            None => self.endpoint(&["api", "logs"])?,
        };

        if query.limit.is_some() || query.offset.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }

        self.call("GET", url, None::<&()>).await
    }

    /// Runs one iteration of the device poll loop.
    ///
    /// Reads the status and acknowledges a pending stop request, which is
    /// what the firmware does when it silences the buzzer.
    pub async fn poll_once(&self, device_id: &str) -> Result<PollOutcome, ClientError> {
        let state = self.status(device_id).await?.data.unwrap_or_default();

        if state.stop_requested {
            self.acknowledge(device_id).await?;
            return Ok(PollOutcome::Acknowledged);
        }
        if state.ringing {
            return Ok(PollOutcome::Ringing);
        }
        Ok(PollOutcome::Idle)
    }

    /// Polls the device state every `interval`, acknowledging stop requests.
    ///
    /// Stops after `max_polls` iterations when given. Returns the number of
    /// acknowledgements sent.
    pub async fn watch<F>(
        &self,
        device_id: &str,
        interval: Duration,
        max_polls: Option<u32>,
        mut on_poll: F,
    ) -> Result<u32, ClientError>
    where
        F: FnMut(u32, PollOutcome),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut acknowledged = 0;
        let mut polls = 0;
        while max_polls.is_none_or(|max| polls < max) {
            ticker.tick().await;
            polls += 1;

            let outcome = self.poll_once(device_id).await?;
            if outcome == PollOutcome::Acknowledged {
                acknowledged += 1;
            }
            on_poll(polls, outcome);
        }

        Ok(acknowledged)
    }

    async fn alarm(
        &self,
        method: &'static str,
        device_id: &str,
        action: &str,
    ) -> Result<ApiResponse<AlarmState>, ClientError> {
        let url = self.endpoint(&["api", "alarm", device_id, action])?;
        self.call(method, url, None::<&()>).await
    }

    /// Joins path segments onto the server URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes the response envelope.
    async fn call<B, T>(
        &self,
        method: &'static str,
        url: Url,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ClientError::MalformedResponse(format!("cannot encode request: {e}")))?;

        let (status, bytes) = self.send_request_with_retry(method, url, body).await?;
        decode_envelope(status, &bytes)
    }

    /// Sends a request with retry logic.
    async fn send_request_with_retry(
        &self,
        method: &'static str,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        let mut attempt = 1;
        loop {
            match self.send_request(method, url.clone(), body.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    tracing::warn!("request failed (attempt {}/{}): {}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends a single request and returns the status code and body.
    async fn send_request(
        &self,
        method: &'static str,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<(u16, Vec<u8>), ClientError> {
        tracing::debug!(method, url = %url, "sending request");

        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, method, &url, body.as_deref()))
            .await
            .map_err(|e| ClientError::Transport(format!("request task failed: {e}")))?
    }
}

// ============================================================================
// HTTP helpers
// ============================================================================

fn build_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .timeout_read(Duration::from_secs(IO_TIMEOUT_SECS))
        .timeout_write(Duration::from_secs(IO_TIMEOUT_SECS))
        .user_agent(concat!("despertador/", env!("CARGO_PKG_VERSION")))
        // One connection per request, like the device firmware.
        .max_idle_connections(0)
        .build()
}

/// Runs one blocking exchange. Non-2xx responses are returned, not errors,
/// so the caller can decode the server's error envelope.
fn execute(
    agent: &ureq::Agent,
    method: &str,
    url: &Url,
    body: Option<&[u8]>,
) -> Result<(u16, Vec<u8>), ClientError> {
    let request = agent
        .request_url(method, url)
        .set("Accept", "application/json");
    let result = match body {
        Some(body) => request
            .set("Content-Type", "application/json")
            .send_bytes(body),
        None => request.call(),
    };

    let response = match result {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => return Err(transport_error(url, &transport)),
    };

    let status = response.status();
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_RESPONSE_SIZE)
        .read_to_end(&mut bytes)?;
    Ok((status, bytes))
}

fn transport_error(url: &Url, transport: &ureq::Transport) -> ClientError {
    let addr = authority_of(url);
    match transport.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed => ClientError::Connect {
            addr,
            reason: transport
                .message()
                .map_or_else(|| transport.kind().to_string(), str::to_string),
        },
        ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
            ClientError::InvalidUrl(url.to_string())
        }
        _ if is_timeout(transport) => ClientError::Timeout(addr),
        _ => ClientError::Transport(transport.to_string()),
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let raw = format!("{:?} {}", transport.kind(), transport).to_ascii_lowercase();
    raw.contains("timed out") || raw.contains("timeout")
}

fn authority_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port_or_known_default() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Decodes a JSON envelope, turning `success: false` into an error.
fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<ApiResponse<T>, ClientError> {
    let response: ApiResponse<T> = serde_json::from_slice(body).map_err(|e| {
        if status >= 400 {
            ClientError::Server {
                status,
                message: String::from_utf8_lossy(body).into_owned(),
            }
        } else {
            ClientError::MalformedResponse(e.to_string())
        }
    })?;

    if !response.success || status >= 400 {
        let message = response
            .error
            .or(response.message)
            .unwrap_or_else(|| "request failed".to_string());
        return Err(ClientError::Server { status, message });
    }

    Ok(response)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    /// Reads one full HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buffer = [0u8; 1024];
        loop {
            let n = stream.read(&mut buffer).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buffer[..n]);

            let text = String::from_utf8_lossy(&raw).into_owned();
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if body.len() >= length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Serves one canned raw HTTP response and returns the request it read.
    async fn one_shot_raw(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        (format!("http://{addr}"), handle)
    }

    /// Serves one JSON response with the given status line.
    async fn one_shot_server(
        status_line: &str,
        body: &str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        one_shot_raw(format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await
    }

    // ------------------------------------------------------------------------
    // URL Tests
    // ------------------------------------------------------------------------

    mod url_tests {
        use super::*;

        #[test]
        fn test_default_url() {
            let client = AlarmClient::new().unwrap();
            assert_eq!(client.authority(), "127.0.0.1:3001");
        }

        #[test]
        fn test_url_without_port_uses_scheme_default() {
            let client = AlarmClient::with_server_url("http://alarm.local").unwrap();
            assert_eq!(client.authority(), "alarm.local:80");

            let client = AlarmClient::with_server_url("https://alarm.local").unwrap();
            assert_eq!(client.authority(), "alarm.local:443");
        }

        #[test]
        fn test_url_with_prefix() {
            let client = AlarmClient::with_server_url("http://gateway:3000/despertador/").unwrap();
            assert_eq!(client.authority(), "gateway:3000");

            let url = client.endpoint(&["api", "logs"]).unwrap();
            assert_eq!(url.as_str(), "http://gateway:3000/despertador/api/logs");
        }

        #[test]
        fn test_ipv6_literal() {
            let client = AlarmClient::with_server_url("http://[::1]:3001").unwrap();
            assert_eq!(client.authority(), "[::1]:3001");
            let bare = AlarmClient::with_server_url("http://[::1]").unwrap();
            assert_eq!(bare.authority(), "[::1]:80");
        }

        #[test]
        fn test_rejects_other_schemes_and_garbage() {
            assert!(matches!(
                AlarmClient::with_server_url("ftp://alarm.local"),
                Err(ClientError::InvalidUrl(_))
            ));
            assert!(AlarmClient::with_server_url("alarm.local:3001").is_err());
            assert!(AlarmClient::with_server_url("http://").is_err());
            assert!(AlarmClient::with_server_url("http://alarm.local/?x=1").is_err());
        }

        #[test]
        fn test_endpoint_encodes_device_id() {
            let client = AlarmClient::new().unwrap();

            let url = client
                .endpoint(&["api", "alarm", "a b/c", "trigger"])
                .unwrap();
            assert_eq!(url.path(), "/api/alarm/a%20b%2Fc/trigger");

            let url = client.endpoint(&["api", "alarm", "quarto?#", "status"]).unwrap();
            assert_eq!(url.path(), "/api/alarm/quarto%3F%23/status");
            assert!(url.query().is_none());

            let url = client.endpoint(&["api", "alarm", "dev\n1", "ack"]).unwrap();
            assert_eq!(url.path(), "/api/alarm/dev%0A1/ack");
        }
    }

    // ------------------------------------------------------------------------
    // Envelope Tests
    // ------------------------------------------------------------------------

    mod envelope_tests {
        use super::*;

        #[test]
        fn test_decode_envelope_success() {
            let body = br#"{"success":true,"data":{"ringing":true,"stopRequested":false}}"#;
            let response: ApiResponse<AlarmState> = decode_envelope(200, body).unwrap();
            assert!(response.data.unwrap().ringing);
        }

        #[test]
        fn test_decode_envelope_error() {
            let body = br#"{"success":false,"error":"endpoint not found"}"#;
            let result: Result<ApiResponse<AlarmState>, _> = decode_envelope(404, body);
            match result {
                Err(ClientError::Server { status, message }) => {
                    assert_eq!(status, 404);
                    assert_eq!(message, "endpoint not found");
                }
                other => panic!("Expected server error, got {other:?}"),
            }
        }

        #[test]
        fn test_decode_envelope_non_json_error_body() {
            let result: Result<ApiResponse<AlarmState>, _> =
                decode_envelope(502, b"Bad Gateway");
            assert!(matches!(
                result,
                Err(ClientError::Server { status: 502, .. })
            ));
        }

        #[test]
        fn test_decode_envelope_garbage_success_body() {
            let result: Result<ApiResponse<AlarmState>, _> = decode_envelope(200, b"not json");
            assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
        }
    }

    // ------------------------------------------------------------------------
    // Client Tests
    // ------------------------------------------------------------------------

    mod client_tests {
        use super::*;

        #[tokio::test]
        async fn test_connection_failure_is_retryable_error() {
            // Bind then drop to get a port that refuses connections.
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let client = AlarmClient::with_server_url(&format!("http://{addr}")).unwrap();
            let result = client.status("dev1").await;

            let err = result.unwrap_err();
            assert!(err.is_retryable());
            assert!(err.to_string().contains(&addr.to_string()));
            assert!(err.to_string().contains("despertador serve"));
        }

        #[tokio::test]
        async fn test_trigger_sends_post_to_encoded_path() {
            let (url, server) = one_shot_server(
                "200 OK",
                r#"{"success":true,"message":"ok","data":{"ringing":true,"stopRequested":false}}"#,
            )
            .await;

            let client = AlarmClient::with_server_url(&url).unwrap();
            let response = client.trigger("sala 1").await.unwrap();
            assert_eq!(response.message.as_deref(), Some("ok"));

            let request = server.await.unwrap();
            assert!(request.starts_with("POST /api/alarm/sala%201/trigger HTTP/1.1\r\n"));
            assert!(request.contains("Accept: application/json"));
        }

        #[tokio::test]
        async fn test_update_config_sends_json_body() {
            let (url, server) = one_shot_server(
                "400 Bad Request",
                r#"{"success":false,"error":"invalid alarm time"}"#,
            )
            .await;

            let client = AlarmClient::with_server_url(&url).unwrap();
            let update = ConfigUpdate {
                light_threshold: Some(250),
                ..Default::default()
            };
            let err = client.update_config("dev1", &update).await.unwrap_err();
            assert!(!err.is_retryable());
            assert!(err.to_string().contains("invalid alarm time"));

            let request = server.await.unwrap();
            assert!(request.starts_with("PUT /api/config/dev1 HTTP/1.1\r\n"));
            assert!(request.contains("Content-Type: application/json"));
            assert!(request.ends_with(r#"{"lightThreshold":250}"#));
        }

        #[tokio::test]
        async fn test_list_logs_builds_query() {
            let (url, server) =
                one_shot_server("200 OK", r#"{"success":true,"data":[],"count":0}"#).await;

            let client = AlarmClient::with_server_url(&url).unwrap();
            let query = LogQuery {
                limit: Some(5),
                offset: Some(10),
            };
            let response = client.list_logs(Some("dev1"), query).await.unwrap();
            assert_eq!(response.count, Some(0));

            let request = server.await.unwrap();
            assert!(request.starts_with("GET /api/logs/dev1?limit=5&offset=10 HTTP/1.1\r\n"));
        }

        #[tokio::test]
        async fn test_oversized_chunk_is_an_error_not_a_crash() {
            let (url, _server) = one_shot_raw(
                "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
                 ffffffffffffffff\r\n{}\r\n0\r\n\r\n"
                    .to_string(),
            )
            .await;

            let client = AlarmClient::with_server_url(&url).unwrap();
            let err = client.status("dev1").await.unwrap_err();

            // A panic in the blocking task would surface as `Transport`.
            assert!(
                matches!(err, ClientError::Io(_) | ClientError::MalformedResponse(_)),
                "unexpected error: {err:?}"
            );
        }

        #[tokio::test]
        async fn test_truncated_body_is_an_error() {
            let (url, _server) = one_shot_raw(
                "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"success\":true"
                    .to_string(),
            )
            .await;

            let client = AlarmClient::with_server_url(&url).unwrap();
            let err = client.status("dev1").await.unwrap_err();
            assert!(matches!(
                err,
                ClientError::Io(_) | ClientError::MalformedResponse(_)
            ));
        }
    }
}
