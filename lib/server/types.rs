//! Request and response types of the management API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Grace period assumed when a stop request does not name one.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 500;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Request body for `POST /containers`.
#[derive(Debug, Deserialize)]
pub struct CreateContainerRequest {
    /// Unique container name.
    pub name: String,

    /// Program to execute inside the container.
    pub command: String,

    /// Arguments handed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory copied into the bundle as the container's rootfs.
    pub rootfs_path: String,

    /// Mount the rootfs read-only.
    #[serde(default)]
    pub rootfs_readonly: bool,

    /// Keep the container's stdin open for attaching.
    #[serde(default)]
    pub stdin: bool,

    /// Close stdin once the first attached client detaches.
    #[serde(default)]
    pub stdin_once: bool,
}

/// Response body for `POST /containers`.
#[derive(Debug, Serialize)]
pub struct CreateContainerResponse {
    /// ID of the created container.
    pub container_id: String,
}

/// Request body for `POST /containers/{id}/stop`.
#[derive(Debug, Deserialize)]
pub struct StopContainerRequest {
    /// Grace period the caller asks for, in milliseconds.
    #[serde(default = "default_stop_timeout_ms")]
    pub timeout_ms: u64,
}

/// Response body for `GET /containers`.
#[derive(Debug, Serialize)]
pub struct ListContainersResponse {
    /// All containers, ordered by creation time then ID.
    pub containers: Vec<ContainerInfo>,
}

/// Response body for `GET /containers/{id}`.
#[derive(Debug, Serialize)]
pub struct ContainerStatusResponse {
    /// The reconciled container.
    pub container: ContainerInfo,
}

/// API projection of a single container.
#[derive(Debug, Serialize)]
pub struct ContainerInfo {
    /// Container ID.
    pub id: String,

    /// Container name.
    pub name: String,

    /// Lifecycle status token.
    pub status: String,

    /// Exit code of the container's process once stopped.
    pub exit_code: i32,

    /// When the container was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the container was last started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the container's process exited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Program the container runs.
    pub command: String,

    /// Arguments handed to the program.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Rootfs directory the bundle was built from.
    pub rootfs_path: String,

    /// File the container's output is appended to.
    pub log_path: String,

    /// Socket a streaming client attaches to the container through.
    pub attach_path: String,
}

/// Response body for operations with nothing to report.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

/// Error response returned when an operation fails.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn default_stop_timeout_ms() -> u64 {
    DEFAULT_STOP_TIMEOUT_MS
}
