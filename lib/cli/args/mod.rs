//! Argument definitions of the monobox binaries.

mod monobox;
mod monoboxd;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use monobox::*;
pub use monoboxd::*;
