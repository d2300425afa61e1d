//! `monoboxd` is the daemon that owns the container registry and serves the
//! management API.
//!
//! ## Usage
//!
//! ```bash
//! monoboxd \
//!     --lib-root=/var/lib/monobox \
//!     --run-root=/run/monobox \
//!     --runtime=/usr/bin/runc \
//!     --runtime-root=/run/monobox-runc \
//!     --shim=/usr/local/bin/monobox-shim \
//!     --listen=127.0.0.1:2477
//! ```

use std::sync::Arc;

use clap::Parser;
use monobox::{
    cli::MonoboxdArgs,
    config::Config,
    oci::RuncRuntime,
    orchestration::Orchestrator,
    server::{self, ServerState},
    store::ContainerStore,
    MonoboxError, MonoboxResult,
};
use tracing_subscriber::{fmt, EnvFilter};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> MonoboxResult<()> {
    // Parse command line arguments
    let args = MonoboxdArgs::parse();

    // Initialize tracing subscriber with EnvFilter
    let default_directive = if args.verbose { "debug" } else { "info" };
    fmt()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    if !args.runtime.is_file() {
        return Err(MonoboxError::BinaryNotFound(
            args.runtime.display().to_string(),
        ));
    }

    if !args.shim.is_file() {
        return Err(MonoboxError::BinaryNotFound(
            args.shim.display().to_string(),
        ));
    }

    let config = Config::builder()
        .lib_root(args.lib_root)
        .run_root(args.run_root)
        .runtime_path(args.runtime)
        .runtime_root(args.runtime_root)
        .shim_path(args.shim)
        .listen_addr(args.listen)
        .build();

    let runtime = RuncRuntime::new(
        config.get_runtime_path().clone(),
        config.get_runtime_root().clone(),
        config.get_shim_path().clone(),
    );

    let cstore = ContainerStore::new(config.get_lib_root().clone());

    // Restores surviving containers before the API accepts requests.
    let orchestrator = Orchestrator::new(
        Arc::new(runtime),
        cstore,
        config.log_dir(),
        config.exit_dir(),
        config.attach_dir(),
    )
    .await?;

    let state = ServerState::new(orchestrator);
    server::serve(state, *config.get_listen_addr()).await
}
