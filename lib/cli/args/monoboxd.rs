use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;

use crate::{
    cli::styles,
    config::DEFAULT_SERVER_PORT,
    utils::{
        DEFAULT_LIB_ROOT_DIR, DEFAULT_RUNTIME_BIN, DEFAULT_RUNTIME_ROOT_DIR, DEFAULT_RUN_ROOT_DIR,
        DEFAULT_SHIM_BIN,
    },
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments for the monoboxd daemon
#[derive(Debug, Parser)]
#[command(name = "monoboxd", author, about, version, styles=styles::styles())]
pub struct MonoboxdArgs {
    /// Directory for container bundles and state documents
    #[arg(long, default_value = DEFAULT_LIB_ROOT_DIR)]
    pub lib_root: PathBuf,

    /// Directory for runtime exit and attach files
    #[arg(long, default_value = DEFAULT_RUN_ROOT_DIR)]
    pub run_root: PathBuf,

    /// Path to the OCI runtime binary
    #[arg(long, default_value = DEFAULT_RUNTIME_BIN)]
    pub runtime: PathBuf,

    /// Root directory handed to the OCI runtime
    #[arg(long, default_value = DEFAULT_RUNTIME_ROOT_DIR)]
    pub runtime_root: PathBuf,

    /// Path to the launch shim binary
    #[arg(long, default_value = DEFAULT_SHIM_BIN)]
    pub shim: PathBuf,

    /// Address to serve the management API on
    #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_SERVER_PORT))]
    pub listen: SocketAddr,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
