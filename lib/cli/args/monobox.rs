use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{cli::styles, config::DEFAULT_SERVER_URL, server::DEFAULT_STOP_TIMEOUT_MS};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments for the monobox command line client
#[derive(Debug, Parser)]
#[command(name = "monobox", author, about, version, styles=styles::styles())]
pub struct MonoboxArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<MonoboxSubcommand>,

    /// Base URL of the monoboxd management API
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL)]
    pub host: String,
}

/// Available subcommands for managing containers
#[derive(Debug, Subcommand)]
pub enum MonoboxSubcommand {
    /// Create a new container
    #[command(name = "create")]
    Create {
        /// Name of the container
        #[arg(required = true)]
        name: String,

        /// Path to the root filesystem copied into the container
        #[arg(short = 'I', long)]
        image: PathBuf,

        /// Mount the root filesystem read-only
        #[arg(short = 'R', long)]
        rootfs_readonly: bool,

        /// Keep stdin open for attaching
        #[arg(short = 'i', long)]
        stdin: bool,

        /// Keep stdin open after the first attach session detaches
        #[arg(long)]
        leave_stdin_open: bool,

        /// Command and arguments after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Start a created container
    #[command(name = "start")]
    Start {
        /// ID of the container
        #[arg(required = true)]
        id: String,
    },

    /// Stop a running container
    #[command(name = "stop")]
    Stop {
        /// ID of the container
        #[arg(required = true)]
        id: String,

        /// Grace period in milliseconds before the kill escalates
        #[arg(long, default_value_t = DEFAULT_STOP_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Remove a container and its on-disk state
    #[command(name = "remove")]
    Remove {
        /// ID of the container
        #[arg(required = true)]
        id: String,
    },

    /// List containers
    #[command(name = "list")]
    List,

    /// Show the reconciled status of a container
    #[command(name = "status")]
    Status {
        /// ID of the container
        #[arg(required = true)]
        id: String,
    },
}
