use std::path::Path;

use oci_spec::runtime::{ProcessBuilder, RootBuilder, Spec};

use crate::MonoboxResult;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// PATH handed to container processes, which bring no environment of
/// their own.
const DEFAULT_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Generates the bundle's `config.json` for the given command line.
///
/// Starts from the crate's default Linux spec (standard namespaces and
/// mounts) and overrides the process and root sections: argv becomes
/// `[command, args..]` with the terminal off, and the root points at the
/// container's private rootfs copy.
pub fn runtime_spec(
    command: &str,
    args: &[String],
    root_path: impl AsRef<Path>,
    root_readonly: bool,
) -> MonoboxResult<Vec<u8>> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(command.to_string());
    argv.extend(args.iter().cloned());

    let process = ProcessBuilder::default()
        .args(argv)
        .env(vec![DEFAULT_PATH_ENV.to_string()])
        .cwd("/")
        .terminal(false)
        .build()?;

    let root = RootBuilder::default()
        .path(root_path.as_ref())
        .readonly(root_readonly)
        .build()?;

    let mut spec = Spec::default();
    spec.set_process(Some(process));
    spec.set_root(Some(root));

    Ok(serde_json::to_vec_pretty(&spec)?)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_runtime_spec_carries_command_line() -> anyhow::Result<()> {
        let args = vec!["-c".to_string(), "echo hi".to_string()];
        let bytes = runtime_spec("/bin/sh", &args, "/tmp/bundle/rootfs", false)?;

        let spec: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(
            spec["process"]["args"],
            serde_json::json!(["/bin/sh", "-c", "echo hi"])
        );
        assert_eq!(spec["process"]["terminal"], Value::Bool(false));
        assert_eq!(spec["process"]["cwd"], Value::String("/".to_string()));
        assert_eq!(
            spec["root"]["path"],
            Value::String("/tmp/bundle/rootfs".to_string())
        );
        assert!(spec["ociVersion"].is_string());
        Ok(())
    }

    #[test]
    fn test_runtime_spec_readonly_root() -> anyhow::Result<()> {
        let bytes = runtime_spec("/bin/true", &[], "/tmp/bundle/rootfs", true)?;
        let spec: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(spec["root"]["readonly"], Value::Bool(true));
        assert_eq!(spec["process"]["args"], serde_json::json!(["/bin/true"]));
        Ok(())
    }
}
