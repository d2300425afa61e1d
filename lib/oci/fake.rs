use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;

use crate::{container::ContainerId, shim::TerminationStatus, MonoboxError, MonoboxResult};

use super::{ContainerState, OciRuntime, Signal};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const STATUS_CREATED: &str = "created";
const STATUS_RUNNING: &str = "running";
const STATUS_STOPPED: &str = "stopped";

/// PID handed out to the first fake container.
const FIRST_FAKE_PID: u32 = 1000;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Scripted in-process stand-in for the external runtime.
///
/// Keeps per-container status in memory and writes real termination
/// records to the exit files the orchestrator hands it, so the rest of
/// the system runs unmodified against it. Knob methods shape how start
/// and kill behave.
#[derive(Clone, Debug, Default)]
pub struct FakeRuntime {
    inner: Arc<RwLock<FakeRuntimeInner>>,
}

#[derive(Debug, Default)]
struct FakeRuntimeInner {
    containers: HashMap<ContainerId, FakeContainer>,
    next_pid: u32,
    fail_create: bool,
    hold_on_start: bool,
    exit_on_start: Option<i32>,
    ignore_term: bool,
    ignore_kill: bool,
    term_exit_code: i32,
}

#[derive(Debug)]
struct FakeContainer {
    status: &'static str,
    pid: u32,
    bundle_dir: PathBuf,
    exit_file: PathBuf,
    created: chrono::DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FakeRuntime {
    /// Creates a fake with default behavior: start succeeds and reaches
    /// running, TERM stops with exit code 0, KILL always stops.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent create call fail.
    pub fn fail_create(&self) {
        self.write().fail_create = true;
    }

    /// Leaves containers in `created` after start, as if the process
    /// never came up.
    pub fn hold_on_start(&self) {
        self.write().hold_on_start = true;
    }

    /// Makes started containers exit immediately with the given code.
    pub fn exit_on_start(&self, exit_code: i32) {
        self.write().exit_on_start = Some(exit_code);
    }

    /// Makes containers survive SIGTERM.
    pub fn ignore_term(&self) {
        self.write().ignore_term = true;
    }

    /// Makes containers survive SIGKILL as well.
    pub fn ignore_kill(&self) {
        self.write().ignore_kill = true;
    }

    /// Sets the exit code containers record when TERM stops them.
    pub fn term_exit_code(&self, exit_code: i32) {
        self.write().term_exit_code = exit_code;
    }

    /// Marks a running container exited behind the manager's back and
    /// writes its termination record.
    pub async fn exit_container(&self, id: &ContainerId, exit_code: i32) -> MonoboxResult<()> {
        let exit_file = {
            let mut inner = self.write();
            let container = inner
                .containers
                .get_mut(id)
                .ok_or_else(|| Self::unknown_container(id))?;
            container.status = STATUS_STOPPED;
            container.exit_file.clone()
        };
        let record = TerminationStatus::Exited {
            at: Utc::now(),
            exit_code,
        };
        fs::write(&exit_file, record.to_vec()?).await?;
        Ok(())
    }

    /// Drops the runtime's record of the container, as if its state
    /// vanished out from under the manager.
    pub fn forget_container(&self, id: &ContainerId) {
        self.write().containers.remove(id);
    }

    /// The status token the fake currently holds for the container.
    pub fn status_of(&self, id: &ContainerId) -> Option<String> {
        self.read()
            .containers
            .get(id)
            .map(|container| container.status.to_string())
    }

    fn unknown_container(id: &ContainerId) -> MonoboxError {
        MonoboxError::RuntimeExecFailed {
            context: format!("container {}", id),
            stderr: "container does not exist".to_string(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FakeRuntimeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FakeRuntimeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl OciRuntime for FakeRuntime {
    async fn create_container(
        &self,
        id: &ContainerId,
        bundle_dir: &Path,
        _log_file: &Path,
        exit_file: &Path,
        _attach_file: &Path,
        _stdin: bool,
        _stdin_once: bool,
        _timeout: Duration,
    ) -> MonoboxResult<u32> {
        let mut inner = self.write();
        if inner.fail_create {
            return Err(MonoboxError::RuntimeExecFailed {
                context: format!("creating container {}", id),
                stderr: "injected create failure".to_string(),
            });
        }
        if !bundle_dir.is_dir() {
            return Err(MonoboxError::RuntimeExecFailed {
                context: format!("creating container {}", id),
                stderr: format!("bundle not found: {}", bundle_dir.display()),
            });
        }

        let pid = FIRST_FAKE_PID + inner.next_pid;
        inner.next_pid += 1;
        inner.containers.insert(
            id.clone(),
            FakeContainer {
                status: STATUS_CREATED,
                pid,
                bundle_dir: bundle_dir.to_path_buf(),
                exit_file: exit_file.to_path_buf(),
                created: Utc::now(),
            },
        );
        Ok(pid)
    }

    async fn start_container(&self, id: &ContainerId) -> MonoboxResult<()> {
        let record = {
            let mut inner = self.write();
            let hold_on_start = inner.hold_on_start;
            let exit_on_start = inner.exit_on_start;
            let container = inner
                .containers
                .get_mut(id)
                .ok_or_else(|| Self::unknown_container(id))?;
            if container.status != STATUS_CREATED {
                return Err(MonoboxError::RuntimeExecFailed {
                    context: format!("starting container {}", id),
                    stderr: format!("container is {}", container.status),
                });
            }

            if hold_on_start {
                None
            } else if let Some(exit_code) = exit_on_start {
                container.status = STATUS_STOPPED;
                Some((
                    container.exit_file.clone(),
                    TerminationStatus::Exited {
                        at: Utc::now(),
                        exit_code,
                    },
                ))
            } else {
                container.status = STATUS_RUNNING;
                None
            }
        };

        if let Some((exit_file, status)) = record {
            fs::write(&exit_file, status.to_vec()?).await?;
        }
        Ok(())
    }

    async fn kill_container(&self, id: &ContainerId, signal: Signal) -> MonoboxResult<()> {
        let record = {
            let mut inner = self.write();
            let ignored = match signal {
                Signal::Term => inner.ignore_term,
                Signal::Kill => inner.ignore_kill,
            };
            let term_exit_code = inner.term_exit_code;
            let container = inner
                .containers
                .get_mut(id)
                .ok_or_else(|| Self::unknown_container(id))?;
            if container.status == STATUS_STOPPED {
                return Err(MonoboxError::RuntimeExecFailed {
                    context: format!("killing container {}", id),
                    stderr: "container not running".to_string(),
                });
            }

            if ignored {
                None
            } else {
                container.status = STATUS_STOPPED;
                let status = match signal {
                    Signal::Term => TerminationStatus::Exited {
                        at: Utc::now(),
                        exit_code: term_exit_code,
                    },
                    Signal::Kill => TerminationStatus::Signaled {
                        at: Utc::now(),
                        signal: signal.number(),
                    },
                };
                Some((container.exit_file.clone(), status))
            }
        };

        if let Some((exit_file, status)) = record {
            fs::write(&exit_file, status.to_vec()?).await?;
        }
        Ok(())
    }

    async fn delete_container(&self, id: &ContainerId) -> MonoboxResult<()> {
        let mut inner = self.write();
        let status = inner
            .containers
            .get(id)
            .map(|container| container.status)
            .ok_or_else(|| Self::unknown_container(id))?;
        if status == STATUS_RUNNING {
            return Err(MonoboxError::RuntimeExecFailed {
                context: format!("deleting container {}", id),
                stderr: "container is running".to_string(),
            });
        }
        inner.containers.remove(id);
        Ok(())
    }

    async fn container_state(&self, id: &ContainerId) -> MonoboxResult<ContainerState> {
        let inner = self.read();
        let container = inner
            .containers
            .get(id)
            .ok_or_else(|| Self::unknown_container(id))?;
        Ok(ContainerState {
            oci_version: "1.0.2".to_string(),
            id: id.to_string(),
            status: container.status.to_string(),
            pid: if container.status == STATUS_STOPPED {
                0
            } else {
                container.pid as i32
            },
            bundle: container.bundle_dir.display().to_string(),
            created: Some(container.created),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    async fn fake_create(
        runtime: &FakeRuntime,
        dir: &Path,
        id: &ContainerId,
    ) -> MonoboxResult<u32> {
        let bundle_dir = dir.join("bundle");
        std::fs::create_dir_all(&bundle_dir)?;
        runtime
            .create_container(
                id,
                &bundle_dir,
                &dir.join("log"),
                &dir.join("exit"),
                &dir.join("attach"),
                false,
                false,
                Duration::from_secs(1),
            )
            .await
    }

    #[tokio::test]
    async fn test_fake_runtime_lifecycle() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let runtime = FakeRuntime::new();
        let id = ContainerId::random();

        let pid = fake_create(&runtime, temp.path(), &id).await?;
        assert!(pid >= FIRST_FAKE_PID);
        assert_eq!(runtime.container_state(&id).await?.status, STATUS_CREATED);

        runtime.start_container(&id).await?;
        let state = runtime.container_state(&id).await?;
        assert_eq!(state.status, STATUS_RUNNING);
        assert_eq!(state.pid, pid as i32);

        runtime.kill_container(&id, Signal::Term).await?;
        let state = runtime.container_state(&id).await?;
        assert_eq!(state.status, STATUS_STOPPED);
        assert_eq!(state.pid, 0);

        // The termination record landed in the exit file.
        let record = TerminationStatus::from_slice(&fs::read(temp.path().join("exit")).await?)?;
        assert!(!record.is_signaled());

        runtime.delete_container(&id).await?;
        assert!(runtime.container_state(&id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_fake_runtime_kill_records_signal() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let runtime = FakeRuntime::new();
        runtime.ignore_term();
        let id = ContainerId::random();

        fake_create(&runtime, temp.path(), &id).await?;
        runtime.start_container(&id).await?;

        runtime.kill_container(&id, Signal::Term).await?;
        assert_eq!(runtime.container_state(&id).await?.status, STATUS_RUNNING);

        runtime.kill_container(&id, Signal::Kill).await?;
        assert_eq!(runtime.container_state(&id).await?.status, STATUS_STOPPED);
        let record = TerminationStatus::from_slice(&fs::read(temp.path().join("exit")).await?)?;
        assert!(record.is_signaled());
        Ok(())
    }

    #[tokio::test]
    async fn test_fake_runtime_behavior_knobs() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let runtime = FakeRuntime::new();
        let id = ContainerId::random();

        runtime.fail_create();
        assert!(fake_create(&runtime, temp.path(), &id).await.is_err());

        let runtime = FakeRuntime::new();
        runtime.hold_on_start();
        fake_create(&runtime, temp.path(), &id).await?;
        runtime.start_container(&id).await?;
        assert_eq!(runtime.container_state(&id).await?.status, STATUS_CREATED);

        runtime.forget_container(&id);
        assert!(runtime.container_state(&id).await.is_err());
        Ok(())
    }
}
