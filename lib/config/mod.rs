//! Daemon configuration.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use getset::Getters;
use typed_builder::TypedBuilder;

use crate::utils::{
    ATTACH_SUBDIR, DEFAULT_LIB_ROOT_PATH, DEFAULT_RUNTIME_BIN_PATH, DEFAULT_RUNTIME_ROOT_PATH,
    DEFAULT_RUN_ROOT_PATH, DEFAULT_SHIM_BIN_PATH, EXITS_SUBDIR, LOGS_SUBDIR,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Default port the management API listens on.
pub const DEFAULT_SERVER_PORT: u16 = 2477;

/// Default base URL clients use to reach the management API.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:2477";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The monobox daemon configuration.
#[derive(Debug, Clone, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Config {
    /// Root of the persistent state: container directories and logs.
    #[builder(default = DEFAULT_LIB_ROOT_PATH.clone(), setter(into))]
    lib_root: PathBuf,

    /// Root of the volatile state: exit files and attach sockets.
    #[builder(default = DEFAULT_RUN_ROOT_PATH.clone(), setter(into))]
    run_root: PathBuf,

    /// Path to the OCI runtime binary.
    #[builder(default = DEFAULT_RUNTIME_BIN_PATH.clone(), setter(into))]
    runtime_path: PathBuf,

    /// State directory handed to the runtime as its `--root`.
    #[builder(default = DEFAULT_RUNTIME_ROOT_PATH.clone(), setter(into))]
    runtime_root: PathBuf,

    /// Path to the launch shim binary.
    #[builder(default = DEFAULT_SHIM_BIN_PATH.clone(), setter(into))]
    shim_path: PathBuf,

    /// Address the management API listens on.
    #[builder(default = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_SERVER_PORT))]
    listen_addr: SocketAddr,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Config {
    /// Directory of per-container log files.
    pub fn log_dir(&self) -> PathBuf {
        self.lib_root.join(LOGS_SUBDIR)
    }

    /// Directory of per-container termination record files.
    pub fn exit_dir(&self) -> PathBuf {
        self.run_root.join(EXITS_SUBDIR)
    }

    /// Directory of per-container attach sockets.
    pub fn attach_dir(&self) -> PathBuf {
        self.run_root.join(ATTACH_SUBDIR)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.get_lib_root(), Path::new("/var/lib/monobox"));
        assert_eq!(config.get_run_root(), Path::new("/run/monobox"));
        assert_eq!(config.get_runtime_path(), Path::new("/usr/bin/runc"));
        assert_eq!(config.get_runtime_root(), Path::new("/run/monobox-runc"));
        assert_eq!(
            config.get_shim_path(),
            Path::new("/usr/local/bin/monobox-shim")
        );
        assert_eq!(
            *config.get_listen_addr(),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_SERVER_PORT)
        );
    }

    #[test]
    fn test_config_derived_dirs() {
        let config = Config::builder()
            .lib_root("/tmp/mb-lib")
            .run_root("/tmp/mb-run")
            .build();
        assert_eq!(config.log_dir(), Path::new("/tmp/mb-lib/logs"));
        assert_eq!(config.exit_dir(), Path::new("/tmp/mb-run/exits"));
        assert_eq!(config.attach_dir(), Path::new("/tmp/mb-run/attach"));
    }
}
