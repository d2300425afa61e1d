use std::path::{Path, PathBuf};

use tokio::fs;

use crate::MonoboxResult;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates a directory and all of its parents if they do not exist yet.
pub async fn ensure_dir_exists(path: impl AsRef<Path>) -> MonoboxResult<PathBuf> {
    let path = path.as_ref();
    fs::create_dir_all(path).await?;
    Ok(path.to_path_buf())
}

/// Copies a directory tree, preserving file permissions and recreating symlinks.
///
/// The walk is iterative over a stack of pending directories so arbitrarily deep
/// trees do not recurse. Symlinks are recreated pointing at their original
/// target rather than followed.
pub async fn copy_dir(source_dir: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> MonoboxResult<()> {
    let source_dir = source_dir.as_ref();
    let dest_dir = dest_dir.as_ref();

    let mut stack = vec![source_dir.to_path_buf()];

    while let Some(current_path) = stack.pop() {
        let target_dir = dest_dir.join(current_path.strip_prefix(source_dir).unwrap());
        let dir_metadata = fs::metadata(&current_path).await?;
        fs::create_dir_all(&target_dir).await?;
        fs::set_permissions(&target_dir, dir_metadata.permissions()).await?;

        let mut entries = fs::read_dir(&current_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let target_path = dest_dir.join(path.strip_prefix(source_dir).unwrap());

            let file_type = fs::symlink_metadata(&path).await?.file_type();
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_symlink() {
                let link_target = fs::read_link(&path).await?;
                fs::symlink(&link_target, &target_path).await?;
            } else {
                // fs::copy carries the source permission bits over
                fs::copy(&path, &target_path).await?;
            }
        }
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_exists_creates_nested_dirs() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let nested = temp.path().join("a").join("b").join("c");

        let created = ensure_dir_exists(&nested).await?;

        assert_eq!(created, nested);
        assert!(nested.is_dir());

        // Calling again on an existing directory is fine
        ensure_dir_exists(&nested).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_copy_dir_copies_files_dirs_and_symlinks() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let source_dir = temp.path().join("source");
        let dest_dir = temp.path().join("dest");

        fs::create_dir_all(source_dir.join("sub/inner")).await?;
        fs::write(source_dir.join("a.txt"), "alpha").await?;
        fs::write(source_dir.join("sub/b.txt"), "beta").await?;
        fs::write(source_dir.join("sub/inner/c.txt"), "gamma").await?;
        std::os::unix::fs::symlink("a.txt", source_dir.join("link.txt"))?;

        copy_dir(&source_dir, &dest_dir).await?;

        assert_eq!(fs::read_to_string(dest_dir.join("a.txt")).await?, "alpha");
        assert_eq!(fs::read_to_string(dest_dir.join("sub/b.txt")).await?, "beta");
        assert_eq!(
            fs::read_to_string(dest_dir.join("sub/inner/c.txt")).await?,
            "gamma"
        );

        let link = dest_dir.join("link.txt");
        assert!(fs::symlink_metadata(&link).await?.file_type().is_symlink());
        assert_eq!(fs::read_link(&link).await?, PathBuf::from("a.txt"));

        Ok(())
    }

    #[tokio::test]
    async fn test_copy_dir_preserves_file_permissions() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let source_dir = temp.path().join("source");
        let dest_dir = temp.path().join("dest");

        fs::create_dir_all(&source_dir).await?;
        let script = source_dir.join("run.sh");
        fs::write(&script, "#!/bin/sh\n").await?;
        fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).await?;

        copy_dir(&source_dir, &dest_dir).await?;

        let mode = fs::metadata(dest_dir.join("run.sh"))
            .await?
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o755);

        Ok(())
    }
}
