use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use getset::Getters;
use serde::Deserialize;
use tokio::{process::Command, time};

use crate::{
    container::ContainerId,
    utils::{CONTAINER_PIDFILE, SHIM_PIDFILE},
    MonoboxError, MonoboxResult,
};

use super::{ContainerState, OciRuntime, Signal};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Launch report kind the shim prints when the container process is up.
const REPORT_KIND_CONTAINER_PID: &str = "container_pid";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runtime implementation that shells out to an OCI runtime binary.
///
/// `start`, `kill`, `delete` and `state` invoke the runtime directly.
/// `create` goes through the launch shim so the container process is
/// reparented away from the daemon and survives its restarts.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct RuncRuntime {
    /// Path to the runtime binary, e.g. `/usr/bin/runc`.
    runtime_path: PathBuf,

    /// The runtime's own state directory, passed as `--root`.
    runtime_root: PathBuf,

    /// Path to the launch shim binary.
    shim_path: PathBuf,
}

/// Single-line JSON the shim prints to its stdout once the launch
/// outcome is known, right before it detaches.
#[derive(Debug, Deserialize)]
struct LaunchReport {
    kind: String,

    #[serde(default)]
    pid: u32,

    #[serde(default)]
    status: String,

    #[serde(default)]
    stderr: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl RuncRuntime {
    /// Creates a runtime that invokes the given binaries.
    pub fn new(
        runtime_path: impl Into<PathBuf>,
        runtime_root: impl Into<PathBuf>,
        shim_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime_path: runtime_path.into(),
            runtime_root: runtime_root.into(),
            shim_path: shim_path.into(),
        }
    }

    /// Runs `<runtime> --root <runtime_root> <args..>` and captures its
    /// output. Non-zero exit becomes `RuntimeExecFailed` with the
    /// captured stderr.
    async fn exec_runtime(&self, args: &[&str]) -> MonoboxResult<Vec<u8>> {
        let output = Command::new(&self.runtime_path)
            .arg("--root")
            .arg(&self.runtime_root)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        tracing::debug!(
            "{} {} exited with {}, stdout=[{}], stderr=[{}]",
            self.runtime_path.display(),
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stdout).trim(),
            String::from_utf8_lossy(&output.stderr).trim(),
        );

        if !output.status.success() {
            return Err(MonoboxError::RuntimeExecFailed {
                context: format!("{} {}", self.runtime_path.display(), args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl OciRuntime for RuncRuntime {
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
    ) -> MonoboxResult<u32> {
        let mut command = Command::new(&self.shim_path);
        command
            .arg("--shim-pidfile")
            .arg(bundle_dir.join(SHIM_PIDFILE))
            .arg("--runtime")
            .arg(&self.runtime_path)
            .arg("--runtime-root")
            .arg(&self.runtime_root)
            .arg("--bundle")
            .arg(bundle_dir)
            .arg("--container-id")
            .arg(id.as_str())
            .arg("--container-pidfile")
            .arg(bundle_dir.join(CONTAINER_PIDFILE))
            .arg("--container-logfile")
            .arg(log_file)
            .arg("--container-exitfile")
            .arg(exit_file)
            .arg("--container-attachfile")
            .arg(attach_file);

        if stdin {
            command.arg("--stdin");
        }
        if stdin_once {
            command.arg("--stdin-once");
        }

        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // The shim closes its stdio and detaches right after printing the
        // report, so this wait returns as soon as the launch outcome is
        // known. A shim that hangs past the bound is killed on drop.
        let output = time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                MonoboxError::Timeout(timeout, format!("shim launch report for container {}", id))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next().unwrap_or_default();
        tracing::debug!(
            "shim for container {} reported [{}], stderr=[{}]",
            id,
            line,
            String::from_utf8_lossy(&output.stderr).trim(),
        );

        let report: LaunchReport =
            serde_json::from_str(line).map_err(|err| MonoboxError::RuntimeExecFailed {
                context: format!("parsing shim launch report for container {}: {}", id, err),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })?;

        if report.kind != REPORT_KIND_CONTAINER_PID || report.pid == 0 {
            return Err(MonoboxError::RuntimeExecFailed {
                context: format!(
                    "shim reported {} launching container {}, status=[{}]",
                    report.kind, id, report.status
                ),
                stderr: report.stderr,
            });
        }

        Ok(report.pid)
    }

    async fn start_container(&self, id: &ContainerId) -> MonoboxResult<()> {
        self.exec_runtime(&["start", id.as_str()]).await?;
        Ok(())
    }

    async fn kill_container(&self, id: &ContainerId, signal: Signal) -> MonoboxResult<()> {
        self.exec_runtime(&["kill", id.as_str(), signal.as_arg()])
            .await?;
        Ok(())
    }

    async fn delete_container(&self, id: &ContainerId) -> MonoboxResult<()> {
        self.exec_runtime(&["delete", id.as_str()]).await?;
        Ok(())
    }

    async fn container_state(&self, id: &ContainerId) -> MonoboxResult<ContainerState> {
        let stdout = self.exec_runtime(&["state", id.as_str()]).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runc_runtime_paths() {
        let runtime = RuncRuntime::new("/usr/bin/runc", "/run/monobox-runc", "/usr/bin/shim");
        assert_eq!(runtime.get_runtime_path(), Path::new("/usr/bin/runc"));
        assert_eq!(runtime.get_runtime_root(), Path::new("/run/monobox-runc"));
        assert_eq!(runtime.get_shim_path(), Path::new("/usr/bin/shim"));
    }

    #[test]
    fn test_launch_report_success_line() -> anyhow::Result<()> {
        let report: LaunchReport =
            serde_json::from_str(r#"{"kind": "container_pid", "pid": 12045}"#)?;
        assert_eq!(report.kind, REPORT_KIND_CONTAINER_PID);
        assert_eq!(report.pid, 12045);
        assert!(report.status.is_empty());
        assert!(report.stderr.is_empty());
        Ok(())
    }

    #[test]
    fn test_launch_report_error_line() -> anyhow::Result<()> {
        let report: LaunchReport = serde_json::from_str(
            r#"{"kind": "error", "status": "exit status 1", "stderr": "exec failed"}"#,
        )?;
        assert_ne!(report.kind, REPORT_KIND_CONTAINER_PID);
        assert_eq!(report.pid, 0);
        assert_eq!(report.stderr, "exec failed");
        Ok(())
    }
}
