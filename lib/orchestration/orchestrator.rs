use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    container::{Container, ContainerId, ContainerMap, ContainerStatus},
    oci::OciRuntime,
    store::ContainerStore,
    utils, MonoboxError, MonoboxResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Sleeps between reconciliations while waiting for a started container
/// to come up: two quick checks, then three slower ones.
pub const START_POLL_SCHEDULE: [Duration; 5] = [
    Duration::from_millis(250),
    Duration::from_millis(250),
    Duration::from_millis(500),
    Duration::from_millis(500),
    Duration::from_millis(500),
];

/// Sleeps between reconciliations after each kill signal.
pub const STOP_POLL_SCHEDULE: [Duration; 2] =
    [Duration::from_millis(250), Duration::from_millis(250)];

/// Bound on the runtime create call, shim launch included.
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(10);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The orchestrator of container lifecycles.
///
/// State documents are written before the runtime is asked to act
/// (optimistic), and every query folds the runtime's observed state back
/// into the document (reconciliation). The two together keep the
/// registry, the store and the runtime convergent without a background
/// sync loop.
///
/// Every lifecycle operation takes `&mut self`: a caller holds exclusive
/// access for an operation's full duration, polling sleeps included. The
/// daemon does this by wrapping the orchestrator in an
/// `Arc<tokio::sync::Mutex<_>>` and locking per request.
pub struct Orchestrator {
    /// The runtime container execution is delegated to.
    pub(super) runtime: Arc<dyn OciRuntime>,

    /// The on-disk store of state documents and bundles.
    pub(super) cstore: ContainerStore,

    /// The in-memory registry, indexed by ID and by name.
    pub(super) cmap: ContainerMap,

    /// Directory of per-container log files.
    pub(super) log_dir: PathBuf,

    /// Directory of per-container termination record files.
    pub(super) exit_dir: PathBuf,

    /// Directory of per-container attach sockets.
    pub(super) attach_dir: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Creates an orchestrator and restores persisted containers.
    ///
    /// Restoration runs before the value is handed out, so by the time
    /// requests reach it the registry reflects every container that
    /// survived the restart and nothing that did not.
    pub async fn new(
        runtime: Arc<dyn OciRuntime>,
        cstore: ContainerStore,
        log_dir: impl Into<PathBuf>,
        exit_dir: impl Into<PathBuf>,
        attach_dir: impl Into<PathBuf>,
    ) -> MonoboxResult<Self> {
        let mut orchestrator = Self {
            runtime,
            cstore,
            cmap: ContainerMap::new(),
            log_dir: utils::ensure_dir_exists(log_dir.into()).await?,
            exit_dir: utils::ensure_dir_exists(exit_dir.into()).await?,
            attach_dir: utils::ensure_dir_exists(attach_dir.into()).await?,
        };
        orchestrator.restore().await?;
        Ok(orchestrator)
    }

    /// The log file the container's output is appended to.
    pub fn container_log_file(&self, id: &ContainerId) -> PathBuf {
        self.log_dir.join(format!("{}.log", id))
    }

    /// The file the shim writes the container's termination record to.
    pub fn container_exit_file(&self, id: &ContainerId) -> PathBuf {
        self.exit_dir.join(id.as_str())
    }

    /// The socket a streaming component reaches the container's stdio
    /// through.
    pub fn container_attach_file(&self, id: &ContainerId) -> PathBuf {
        self.attach_dir.join(id.as_str())
    }

    /// Re-registers every container found in the store and reconciles
    /// each against the runtime.
    ///
    /// Containers that cannot be read, parsed, registered or reconciled
    /// are purged: recovery favors a clean slate over resurrecting state
    /// it cannot trust. A single broken container never aborts the loop.
    async fn restore(&mut self) -> MonoboxResult<()> {
        for handle in self.cstore.find_containers().await? {
            let id = handle.get_container_id().clone();

            let bytes = match self.cstore.container_state_read(&id).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!("purging container {}: state unreadable: {}", id, err);
                    self.purge_container(&id).await;
                    continue;
                }
            };

            let container: Container = match serde_json::from_slice(&bytes) {
                Ok(container) => container,
                Err(err) => {
                    tracing::warn!("purging container {}: state undecodable: {}", id, err);
                    self.purge_container(&id).await;
                    continue;
                }
            };

            if container.get_id() != &id {
                tracing::warn!(
                    "purging container {}: state document belongs to {}",
                    id,
                    container.get_id()
                );
                self.purge_container(&id).await;
                continue;
            }

            if let Err(err) = self.cmap.add(container, None) {
                tracing::warn!("purging container {}: cannot register: {}", id, err);
                self.purge_container(&id).await;
                continue;
            }

            match self.refresh_container(&id).await {
                Ok(container) => {
                    tracing::info!(
                        "restored container {} ({}), status {}",
                        id,
                        container.get_name(),
                        container.get_status()
                    );
                }
                Err(err) => {
                    tracing::warn!("purging container {}: reconciliation failed: {}", id, err);
                    self.purge_container(&id).await;
                }
            }
        }
        Ok(())
    }

    /// Drops every trace of a container the manager cannot trust:
    /// registry entry and store directory. Failures are logged, not
    /// propagated.
    pub(super) async fn purge_container(&mut self, id: &ContainerId) {
        self.cmap.del(id);
        if let Err(err) = self.cstore.delete_container(id).await {
            tracing::warn!("failed to delete directory of container {}: {}", id, err);
        }
    }

    /// Looks the container up in the registry.
    pub(super) fn registered_container(&self, id: &ContainerId) -> MonoboxResult<Container> {
        self.cmap
            .get(id)
            .ok_or_else(|| MonoboxError::ContainerNotFound(id.to_string()))
    }

    /// Fails unless the container's status is one of the expected ones.
    pub(super) fn assert_container_status(
        container: &Container,
        expected: &[ContainerStatus],
    ) -> MonoboxResult<()> {
        if !expected.contains(container.get_status()) {
            return Err(MonoboxError::InvalidContainerStatus {
                actual: container.get_status().to_string(),
                expected: expected
                    .iter()
                    .map(|status| status.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(())
    }

    /// Writes the container's document to the store atomically and syncs
    /// the registry copy.
    pub(super) async fn persist_container(&mut self, container: &Container) -> MonoboxResult<()> {
        let bytes = serde_json::to_vec(container)?;
        self.cstore
            .container_state_write_atomic(container.get_id(), &bytes)
            .await?;
        self.cmap.update(container)?;
        Ok(())
    }

    /// Optimistically moves the container to a status: persisted first,
    /// acted on after.
    pub(super) async fn transition_container(
        &mut self,
        container: &mut Container,
        status: ContainerStatus,
    ) -> MonoboxResult<()> {
        container.set_status(status);
        self.persist_container(container).await
    }
}
