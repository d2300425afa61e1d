use tokio::fs;

use crate::{
    container::{Container, ContainerId, ContainerStatus},
    shim::TerminationStatus,
    MonoboxResult,
};

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Base of the exit code recorded for signaled containers: the signal
/// number is added on top, so SIGKILL (9) records 136.
pub const SIGNALED_EXIT_CODE_BASE: i32 = 127;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Returns the container after reconciling it with the runtime.
    ///
    /// Every successful query is also a reconciliation write: the
    /// observed status, and for stopped containers the termination
    /// outcome, are folded into the document and persisted.
    pub async fn get_container(&mut self, id: &ContainerId) -> MonoboxResult<Container> {
        self.registered_container(id)?;
        self.refresh_container(id).await
    }

    /// Returns every container, reconciled, ordered by creation time
    /// then ID.
    pub async fn list_containers(&mut self) -> MonoboxResult<Vec<Container>> {
        let ids: Vec<ContainerId> = self
            .cmap
            .all()
            .into_iter()
            .map(|container| container.get_id().clone())
            .collect();

        let mut containers = Vec::with_capacity(ids.len());
        for id in ids {
            containers.push(self.refresh_container(&id).await?);
        }
        containers.sort_by(|a, b| {
            (a.get_created_at(), a.get_id()).cmp(&(b.get_created_at(), b.get_id()))
        });
        Ok(containers)
    }

    /// Reconciles one registered container against the runtime's view
    /// and persists the result.
    ///
    /// A stopped container's termination record is read from its exit
    /// file: `finished_at` comes from the record (re-setting the same
    /// instant is fine, the record does not change once written) and the
    /// exit code is the recorded one, or signal-offset for a signaled
    /// container.
    pub(super) async fn refresh_container(&mut self, id: &ContainerId) -> MonoboxResult<Container> {
        let mut container = self.registered_container(id)?;

        let state = self.runtime.container_state(id).await?;
        let status: ContainerStatus = state.status.parse()?;
        container.set_status(status);

        if status == ContainerStatus::Stopped {
            let record = fs::read(self.container_exit_file(id)).await?;
            let termination = TerminationStatus::from_slice(&record)?;
            container.set_finished_at(termination.at())?;
            let exit_code = match termination {
                TerminationStatus::Exited { exit_code, .. } => exit_code,
                TerminationStatus::Signaled { signal, .. } => SIGNALED_EXIT_CODE_BASE + signal,
            };
            container.set_exit_code(exit_code);
        }

        self.persist_container(&container).await?;
        Ok(container)
    }
}
