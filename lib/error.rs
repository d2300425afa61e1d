use std::{
    error::Error,
    fmt::{self, Display},
    time::Duration,
};

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a monobox-related operation.
pub type MonoboxResult<T> = Result<T, MonoboxError>;

/// An error that occurred during a monobox operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum MonoboxError {
    /// An error that occurred when a container ID failed validation.
    #[error("invalid container id: {0}")]
    InvalidContainerId(String),

    /// An error that occurred when a container name failed validation.
    #[error("invalid container name: {0}")]
    InvalidContainerName(String),

    /// An error that occurred when a status string did not map to a known container status.
    #[error("unknown container status: {0}")]
    UnknownContainerStatus(String),

    /// An error that occurred when a container was not found.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// An error that occurred when a container directory already exists on disk.
    #[error("container already exists: {0}")]
    ContainerAlreadyExists(String),

    /// An error that occurred when a container ID was already registered.
    #[error("duplicate container id: {0}")]
    DuplicateContainerId(String),

    /// An error that occurred when a container name was already registered.
    #[error("duplicate container name: {0}")]
    DuplicateContainerName(String),

    /// An error that occurred when an operation found a container in the wrong lifecycle status.
    #[error("invalid container status: {actual}, expected one of: {expected}")]
    InvalidContainerStatus {
        /// The status the container was actually in.
        actual: String,
        /// The statuses the operation would have accepted.
        expected: String,
    },

    /// An error that occurred when a write-once timestamp was set a second time.
    #[error("{0} timestamp already set")]
    TimestampAlreadySet(String),

    /// An error that occurred when a bounded wait on the runtime elapsed.
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    /// An error that occurred when a container did not reach the running status in time.
    #[error("container failed to start, last observed status: {0}")]
    ContainerStartFailed(String),

    /// An error that occurred when a container survived the full kill escalation.
    #[error("cannot kill container: {0}")]
    ContainerStopFailed(String),

    /// An error that occurred when the OCI runtime binary exited unsuccessfully.
    #[error("OCI runtime execution failed: {context}, stderr=[{stderr}]")]
    RuntimeExecFailed {
        /// The invocation that failed.
        context: String,
        /// Captured stderr of the failed invocation.
        stderr: String,
    },

    /// An error that occurred when a termination record failed validation.
    #[error("invalid termination status: {0}")]
    InvalidTerminationStatus(String),

    /// An error that occurred when a required binary was not found.
    #[error("binary not found at: {0}")]
    BinaryNotFound(String),

    /// An error that occurred while generating an OCI runtime spec.
    #[error("oci spec error: {0}")]
    OciSpec(#[from] oci_spec::OciSpecError),

    /// An error that occurred during serialization or deserialization.
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error that occurred during an HTTP request.
    #[error("http request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MonoboxError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> MonoboxError {
        MonoboxError::Custom(AnyError {
            error: error.into(),
        })
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `MonoboxResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> MonoboxResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}
