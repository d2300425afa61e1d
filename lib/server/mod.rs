//! Management API of the daemon.
//!
//! A small REST surface over the orchestrator: create, start, stop,
//! remove, list and query containers. Every handler locks the shared
//! orchestrator for the full duration of its operation, so requests are
//! serialized the way the orchestrator requires.

mod handlers;
mod routes;
mod state;
mod types;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use routes::*;
pub use state::*;
pub use types::*;
