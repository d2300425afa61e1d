use crate::{container::ContainerId, MonoboxError, MonoboxResult};

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Removes a container and every trace of it. Unknown IDs succeed,
    /// so removal is idempotent and safe to retry.
    ///
    /// The state document is unlinked first: from that point the
    /// container counts as removed even if a crash strands the rest of
    /// the sequence, and restore purges the leftovers.
    pub async fn remove_container(&mut self, id: &ContainerId) -> MonoboxResult<()> {
        let container = match self.cmap.get(id) {
            Some(container) => container,
            None => {
                tracing::debug!("remove of unknown container {} is a no-op", id);
                return Ok(());
            }
        };

        match self.cstore.container_state_delete_atomic(id).await {
            Ok(()) => {}
            Err(MonoboxError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                // A prior half-finished remove already unlinked it
                tracing::debug!("state document of container {} already gone", id);
            }
            Err(err) => return Err(err),
        }

        self.runtime.delete_container(id).await?;
        self.cmap.del(id);
        self.cstore.delete_container(id).await?;

        tracing::info!("removed container {} ({})", id, container.get_name());
        Ok(())
    }
}
