//! Integration with the external OCI runtime.
//!
//! This module provides:
//! - The [`OciRuntime`] trait the orchestrator drives containers through
//! - A production implementation shelling out to `runc` via the launch shim
//! - An in-process fake for tests and dry runs
//! - Runtime spec (`config.json`) generation for bundles

mod fake;
mod runc;
mod runtime;
mod spec;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use fake::*;
pub use runc::*;
pub use runtime::*;
pub use spec::*;
