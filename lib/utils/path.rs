use std::{path::PathBuf, sync::LazyLock};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The sub directory of the library root where container directories live.
pub const CONTAINERS_SUBDIR: &str = "containers";

/// The sub directory of a container directory holding the runtime bundle.
pub const BUNDLE_SUBDIR: &str = "bundle";

/// The sub directory of a bundle holding the container's private rootfs copy.
pub const ROOTFS_SUBDIR: &str = "rootfs";

/// The sub directory of the library root where container log files are written.
pub const LOGS_SUBDIR: &str = "logs";

/// The sub directory of the run root where container exit files are written.
pub const EXITS_SUBDIR: &str = "exits";

/// The sub directory of the run root where container attach sockets live.
pub const ATTACH_SUBDIR: &str = "attach";

/// The file name of the persisted container state document.
pub const STATE_FILENAME: &str = "state.json";

/// The file name of the generated OCI runtime spec inside a bundle.
pub const RUNTIME_SPEC_FILENAME: &str = "config.json";

/// The file name of the shim's pidfile inside a bundle.
pub const SHIM_PIDFILE: &str = "shim.pid";

/// The file name of the container's pidfile inside a bundle.
pub const CONTAINER_PIDFILE: &str = "container.pid";

/// The default directory where monobox keeps long-lived state.
pub const DEFAULT_LIB_ROOT_DIR: &str = "/var/lib/monobox";

/// The default directory where monobox keeps runtime-scoped state.
pub const DEFAULT_RUN_ROOT_DIR: &str = "/run/monobox";

/// The default path of the OCI runtime binary.
pub const DEFAULT_RUNTIME_BIN: &str = "/usr/bin/runc";

/// The default root directory handed to the OCI runtime (`--root`).
pub const DEFAULT_RUNTIME_ROOT_DIR: &str = "/run/monobox-runc";

/// The default path of the launch shim binary.
pub const DEFAULT_SHIM_BIN: &str = "/usr/local/bin/monobox-shim";

/// The default path where monobox keeps long-lived state.
pub static DEFAULT_LIB_ROOT_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(DEFAULT_LIB_ROOT_DIR));

/// The default path where monobox keeps runtime-scoped state.
pub static DEFAULT_RUN_ROOT_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(DEFAULT_RUN_ROOT_DIR));

/// The default path of the OCI runtime binary.
pub static DEFAULT_RUNTIME_BIN_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(DEFAULT_RUNTIME_BIN));

/// The default root directory handed to the OCI runtime.
pub static DEFAULT_RUNTIME_ROOT_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(DEFAULT_RUNTIME_ROOT_DIR));

/// The default path of the launch shim binary.
pub static DEFAULT_SHIM_BIN_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(DEFAULT_SHIM_BIN));
