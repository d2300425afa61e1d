//! Container identity, status and the in-memory registry.

mod container;
mod id;
mod map;
mod status;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use container::*;
pub use id::*;
pub use map::*;
pub use status::*;
