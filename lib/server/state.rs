//! Server state shared across request handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::orchestration::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Shared server state handed to every request handler.
///
/// The orchestrator sits behind a mutex, not a read-write lock: queries
/// write reconciliation state too, and lifecycle operations hold the
/// lock across their polling sleeps.
#[derive(Clone)]
pub struct ServerState {
    /// The shared orchestrator instance.
    orchestrator: Arc<Mutex<Orchestrator>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerState {
    /// Wraps an orchestrator for sharing across handlers.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
        }
    }

    /// The orchestrator lock.
    pub fn orchestrator(&self) -> &Arc<Mutex<Orchestrator>> {
        &self.orchestrator
    }
}
