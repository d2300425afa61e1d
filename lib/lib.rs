//! `monobox` is a single-node container manager that delegates execution to an
//! external OCI runtime and owns everything around that delegation.
//!
//! # Overview
//!
//! monobox keeps an in-memory registry of containers, persists each container's
//! state as a JSON document next to its bundle on disk, and drives the container
//! lifecycle (`Created` → `Running` → `Stopped`) by shelling out to an OCI
//! runtime binary such as `runc` through a small launch shim. State is written
//! optimistically before every action and reconciled against the runtime's view
//! on every query, so a crashed daemon can restore its world from disk on the
//! next boot.
//!
//! The crate ships two binaries:
//!
//! - `monoboxd`: the daemon. Restores persisted containers and serves the
//!   HTTP management API.
//! - `monobox`: the client CLI that talks to a running `monoboxd`.

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod config;
pub mod container;
pub mod oci;
pub mod orchestration;
pub mod rollback;
pub mod server;
pub mod shim;
pub mod store;
pub mod utils;

pub use error::*;
