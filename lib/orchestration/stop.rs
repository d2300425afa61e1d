use std::time::Duration;

use tokio::time;

use crate::{
    container::{ContainerId, ContainerStatus},
    oci::Signal,
    MonoboxError, MonoboxResult,
};

use super::{Orchestrator, STOP_POLL_SCHEDULE};

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Stops a container: SIGTERM, a grace window, then SIGKILL and the
    /// same window again.
    ///
    /// The stopped status is persisted before the first signal goes out;
    /// a container that survives both signals leaves the document ahead
    /// of reality until the next query reconciles it back. `timeout` is
    /// what the caller asked for and is logged; the grace window between
    /// signals is fixed.
    pub async fn stop_container(
        &mut self,
        id: &ContainerId,
        timeout: Duration,
    ) -> MonoboxResult<()> {
        let mut container = self.registered_container(id)?;
        Self::assert_container_status(
            &container,
            &[ContainerStatus::Created, ContainerStatus::Running],
        )?;

        tracing::debug!(
            "stopping container {} ({}), requested timeout {:?}",
            id,
            container.get_name(),
            timeout
        );

        self.transition_container(&mut container, ContainerStatus::Stopped)
            .await?;

        for signal in [Signal::Term, Signal::Kill] {
            self.runtime.kill_container(id, signal).await?;
            if self.wait_container_stopped(id).await? {
                tracing::info!("stopped container {} with {}", id, signal);
                return Ok(());
            }
        }

        Err(MonoboxError::ContainerStopFailed(id.to_string()))
    }

    /// Polls the runtime on the stop schedule. True once it reports the
    /// container stopped.
    async fn wait_container_stopped(&mut self, id: &ContainerId) -> MonoboxResult<bool> {
        for delay in STOP_POLL_SCHEDULE {
            time::sleep(delay).await;
            if *self.refresh_container(id).await?.get_status() == ContainerStatus::Stopped {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
