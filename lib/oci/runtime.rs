use std::{fmt, path::Path, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{container::ContainerId, MonoboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A signal the runtime can deliver to a container's init process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Polite termination request (SIGTERM).
    Term,

    /// Forced kill (SIGKILL).
    Kill,
}

/// A container's state as reported by the runtime's `state` query.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    /// OCI runtime spec version the runtime implements.
    #[serde(default)]
    pub oci_version: String,

    /// The container ID the runtime knows this container by.
    pub id: String,

    /// The runtime's status token, e.g. `created`, `running`, `stopped`.
    pub status: String,

    /// PID of the container's init process, 0 once it is gone.
    #[serde(default)]
    pub pid: i32,

    /// The bundle directory the container was created from.
    #[serde(default)]
    pub bundle: String,

    /// When the runtime created the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// The operations the orchestrator needs from an OCI runtime.
///
/// The production implementation shells out to `runc` through the launch
/// shim; tests substitute [`super::FakeRuntime`].
#[async_trait]
pub trait OciRuntime: Send + Sync {
    /// Creates the container from its bundle, supervised by the shim.
    ///
    /// The container's process writes its output to `log_file`, its
    /// termination record to `exit_file`, and exposes its stdio on the
    /// `attach_file` socket. Returns the PID of the container's init
    /// process. Bounded by `timeout`.
    #[allow(clippy::too_many_arguments)]
    async fn create_container(
        &self,
        id: &ContainerId,
        bundle_dir: &Path,
        log_file: &Path,
        exit_file: &Path,
        attach_file: &Path,
        stdin: bool,
        stdin_once: bool,
        timeout: Duration,
    ) -> MonoboxResult<u32>;

    /// Starts a created container's process.
    async fn start_container(&self, id: &ContainerId) -> MonoboxResult<()>;

    /// Delivers a signal to the container's init process.
    async fn kill_container(&self, id: &ContainerId, signal: Signal) -> MonoboxResult<()>;

    /// Deletes the runtime's record of the container.
    async fn delete_container(&self, id: &ContainerId) -> MonoboxResult<()>;

    /// Queries the runtime's view of the container.
    async fn container_state(&self, id: &ContainerId) -> MonoboxResult<ContainerState>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Signal {
    /// The name form the runtime's `kill` verb takes.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Signal::Term => "TERM",
            Signal::Kill => "KILL",
        }
    }

    /// The conventional signal number.
    pub fn number(&self) -> i32 {
        match self {
            Signal::Term => 15,
            Signal::Kill => 9,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG{}", self.as_arg())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_forms() {
        assert_eq!(Signal::Term.as_arg(), "TERM");
        assert_eq!(Signal::Kill.as_arg(), "KILL");
        assert_eq!(Signal::Term.number(), 15);
        assert_eq!(Signal::Kill.number(), 9);
        assert_eq!(Signal::Kill.to_string(), "SIGKILL");
    }

    #[test]
    fn test_container_state_parses_runtime_output() -> anyhow::Result<()> {
        let raw = r#"{
            "ociVersion": "1.0.2",
            "id": "0123456789abcdef0123456789abcdef",
            "status": "running",
            "pid": 4321,
            "bundle": "/var/lib/monobox/containers/0123456789abcdef0123456789abcdef/bundle",
            "created": "2024-03-01T10:00:00Z"
        }"#;

        let state: ContainerState = serde_json::from_str(raw)?;
        assert_eq!(state.status, "running");
        assert_eq!(state.pid, 4321);
        assert!(state.created.is_some());

        // Stopped containers may come back with most fields omitted.
        let sparse: ContainerState =
            serde_json::from_str(r#"{"id": "abc", "status": "stopped"}"#)?;
        assert_eq!(sparse.status, "stopped");
        assert_eq!(sparse.pid, 0);
        assert!(sparse.created.is_none());
        Ok(())
    }
}
