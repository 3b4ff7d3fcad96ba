//! JSON wire types for the measurement endpoints.
//!
//! Field names follow the wire protocol (camelCase); timestamps are integer
//! milliseconds since the Unix epoch unless noted otherwise.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Fixed liveness marker, `"ok"`.
    pub status: String,
    /// Server time when the check was handled.
    pub timestamp: u64,
}

/// Response body of `GET /api/ping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResponse {
    /// Server time in whole milliseconds.
    pub timestamp: u64,
    /// The same instant as fractional seconds, for sub-millisecond math.
    #[serde(rename = "serverTime")]
    pub server_time: f64,
}

/// Response body of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Bytes actually observed on the wire.
    pub received: u64,
    /// Bytes the client declared via `Content-Length`.
    pub expected: u64,
    /// Seconds from first acceptance to end of body, sub-second precision.
    pub duration: f64,
    /// Server time when the body finished arriving.
    pub timestamp: u64,
}

/// Error body returned by non-streaming endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description, never internal detail.
    pub error: String,
}

/// Current time as whole milliseconds since the Unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current time as fractional seconds since the Unix epoch.
pub fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
