//! Container lifecycle orchestration.
//!
//! One file per lifecycle operation, all of them methods on
//! [`Orchestrator`]. The orchestrator keeps the in-memory registry, the
//! on-disk store and the external runtime's view of every container
//! convergent.

mod create;
mod orchestrator;
mod remove;
mod start;
mod status;
mod stop;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use create::*;
pub use orchestrator::*;
pub use status::*;
