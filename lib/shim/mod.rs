//! Types for the records the launch shim leaves behind.

mod termination;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use termination::*;
