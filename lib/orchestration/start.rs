use chrono::Utc;
use tokio::time;

use crate::{
    container::{ContainerId, ContainerStatus},
    MonoboxError, MonoboxResult,
};

use super::{Orchestrator, START_POLL_SCHEDULE};

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Starts a created container and waits for the runtime to report it
    /// running.
    ///
    /// The running status is persisted before the runtime is asked to
    /// act. If the process then fails to come up, the polling
    /// reconciliations have already walked the document back to whatever
    /// the runtime observed.
    pub async fn start_container(&mut self, id: &ContainerId) -> MonoboxResult<()> {
        let mut container = self.registered_container(id)?;
        Self::assert_container_status(&container, &[ContainerStatus::Created])?;

        self.transition_container(&mut container, ContainerStatus::Running)
            .await?;
        self.runtime.start_container(id).await?;

        self.wait_container_started(id).await?;

        let mut container = self.registered_container(id)?;
        container.set_started_at(Utc::now())?;
        self.persist_container(&container).await?;

        tracing::info!("started container {} ({})", id, container.get_name());
        Ok(())
    }

    /// Polls the runtime on the start schedule until the container
    /// leaves `created`. Anything other than `running` at the end of the
    /// wait is a start failure.
    async fn wait_container_started(&mut self, id: &ContainerId) -> MonoboxResult<()> {
        let mut observed = ContainerStatus::Unknown;
        for delay in START_POLL_SCHEDULE {
            time::sleep(delay).await;
            observed = *self.refresh_container(id).await?.get_status();
            if observed != ContainerStatus::Created {
                break;
            }
        }
        if observed != ContainerStatus::Running {
            return Err(MonoboxError::ContainerStartFailed(observed.to_string()));
        }
        Ok(())
    }
}
