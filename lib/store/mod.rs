//! On-disk container store.
//!
//! The store owns the directory layout under the library root:
//!
//! ```text
//! <root>/containers/<32-hex-id>/
//!     state.json          # persisted container document
//!     bundle/
//!         config.json     # generated OCI runtime spec
//!         rootfs/         # private copy of the user-supplied rootfs
//! ```
//!
//! The state document is the system's source of truth across restarts, so its
//! writes are atomic: a temp file in the same directory followed by a rename.
//! Readers never observe a torn document.

use std::path::{Path, PathBuf};

use getset::Getters;
use tokio::fs;

use crate::{
    container::ContainerId,
    rollback::Rollback,
    utils::{
        self, BUNDLE_SUBDIR, CONTAINERS_SUBDIR, ROOTFS_SUBDIR, RUNTIME_SPEC_FILENAME,
        STATE_FILENAME,
    },
    MonoboxError, MonoboxResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The filesystem store for container state and bundles.
#[derive(Clone, Debug)]
pub struct ContainerStore {
    root_dir: PathBuf,
}

/// Paths of a single container's directory tree.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ContainerHandle {
    /// The container this handle points at.
    container_id: ContainerId,

    /// The container's top-level directory.
    container_dir: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ContainerStore {
    /// Creates a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// The directory holding all container directories.
    pub fn containers_dir(&self) -> PathBuf {
        self.root_dir.join(CONTAINERS_SUBDIR)
    }

    /// The directory of a single container.
    pub fn container_dir(&self, id: &ContainerId) -> PathBuf {
        self.containers_dir().join(id.as_str())
    }

    /// Creates the directory for a new container.
    ///
    /// Fails with `ContainerAlreadyExists` if the directory is already there.
    /// On success, if a rollback is supplied, a compensating recursive delete
    /// is registered with it.
    pub async fn create_container(
        &self,
        id: &ContainerId,
        rollback: Option<&mut Rollback>,
    ) -> MonoboxResult<ContainerHandle> {
        let container_dir = self.container_dir(id);
        if fs::try_exists(&container_dir).await? {
            return Err(MonoboxError::ContainerAlreadyExists(id.to_string()));
        }
        fs::create_dir_all(&container_dir).await?;

        if let Some(rollback) = rollback {
            let dir = container_dir.clone();
            rollback.add(move || {
                if let Err(err) = std::fs::remove_dir_all(&dir) {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %err,
                        "failed to roll back container directory"
                    );
                }
            });
        }

        Ok(ContainerHandle {
            container_id: id.clone(),
            container_dir,
        })
    }

    /// Creates the runtime bundle for an existing container: copies the
    /// rootfs into the bundle and writes the runtime spec next to it.
    pub async fn create_container_bundle(
        &self,
        id: &ContainerId,
        spec: &[u8],
        rootfs_src: impl AsRef<Path>,
    ) -> MonoboxResult<()> {
        let handle = self
            .get_container(id)
            .await?
            .ok_or_else(|| MonoboxError::ContainerNotFound(id.to_string()))?;

        fs::create_dir_all(handle.bundle_dir()).await?;
        utils::copy_dir(rootfs_src, handle.rootfs_dir()).await?;
        fs::write(handle.runtime_spec_file(), spec).await?;
        Ok(())
    }

    /// Returns a handle for the container if its directory exists.
    pub async fn get_container(&self, id: &ContainerId) -> MonoboxResult<Option<ContainerHandle>> {
        let container_dir = self.container_dir(id);
        if !fs::try_exists(&container_dir).await? {
            return Ok(None);
        }
        Ok(Some(ContainerHandle {
            container_id: id.clone(),
            container_dir,
        }))
    }

    /// Recursively deletes the container's directory. Ok if already absent.
    pub async fn delete_container(&self, id: &ContainerId) -> MonoboxResult<()> {
        match fs::remove_dir_all(self.container_dir(id)).await {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            result => Ok(result?),
        }
    }

    /// Scans the store and returns a handle for every container directory.
    ///
    /// Entries whose names do not parse as container IDs are skipped with a
    /// warning. An absent containers directory means a fresh store and yields
    /// an empty list.
    pub async fn find_containers(&self) -> MonoboxResult<Vec<ContainerHandle>> {
        let containers_dir = self.containers_dir();
        let mut entries = match fs::read_dir(&containers_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(err.into()),
        };

        let mut handles = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            match name.parse::<ContainerId>() {
                Ok(id) => handles.push(ContainerHandle {
                    container_id: id,
                    container_dir: entry.path(),
                }),
                Err(_) => {
                    tracing::warn!(
                        entry = %name,
                        "skipping store entry that is not a container id"
                    );
                }
            }
        }
        Ok(handles)
    }

    /// Reads the container's persisted state document.
    pub async fn container_state_read(&self, id: &ContainerId) -> MonoboxResult<Vec<u8>> {
        Ok(fs::read(self.container_dir(id).join(STATE_FILENAME)).await?)
    }

    /// Atomically replaces the container's persisted state document.
    pub async fn container_state_write_atomic(
        &self,
        id: &ContainerId,
        bytes: &[u8],
    ) -> MonoboxResult<()> {
        let container_dir = self.container_dir(id);
        let tmp_file = container_dir.join(format!("{}.tmp", STATE_FILENAME));
        fs::write(&tmp_file, bytes).await?;
        fs::rename(&tmp_file, container_dir.join(STATE_FILENAME)).await?;
        Ok(())
    }

    /// Unlinks the container's state document, marking it removed even while
    /// the surrounding directory still exists.
    pub async fn container_state_delete_atomic(&self, id: &ContainerId) -> MonoboxResult<()> {
        fs::remove_file(self.container_dir(id).join(STATE_FILENAME)).await?;
        Ok(())
    }
}

impl ContainerHandle {
    /// The bundle directory handed to the runtime.
    pub fn bundle_dir(&self) -> PathBuf {
        self.container_dir.join(BUNDLE_SUBDIR)
    }

    /// The container's private rootfs copy inside the bundle.
    pub fn rootfs_dir(&self) -> PathBuf {
        self.bundle_dir().join(ROOTFS_SUBDIR)
    }

    /// The generated runtime spec inside the bundle.
    pub fn runtime_spec_file(&self) -> PathBuf {
        self.bundle_dir().join(RUNTIME_SPEC_FILENAME)
    }

    /// The persisted state document.
    pub fn state_file(&self) -> PathBuf {
        self.container_dir.join(STATE_FILENAME)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    async fn make_rootfs(dir: &Path) -> anyhow::Result<PathBuf> {
        let rootfs = dir.join("rootfs_src");
        fs::create_dir_all(rootfs.join("bin")).await?;
        fs::write(rootfs.join("bin/sh"), "#!/bin/sh\n").await?;
        fs::write(rootfs.join("hello.txt"), "hello").await?;
        Ok(rootfs)
    }

    #[tokio::test]
    async fn test_store_create_container_and_duplicate() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let id = ContainerId::random();

        let handle = store.create_container(&id, None).await?;
        assert_eq!(handle.get_container_id(), &id);
        assert!(handle.get_container_dir().is_dir());
        assert_eq!(*handle.get_container_dir(), store.container_dir(&id));

        assert!(matches!(
            store.create_container(&id, None).await,
            Err(MonoboxError::ContainerAlreadyExists(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_create_container_registers_rollback_delete() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let id = ContainerId::random();
        let mut rollback = Rollback::new();

        store.create_container(&id, Some(&mut rollback)).await?;
        assert_eq!(rollback.len(), 1);
        assert!(store.container_dir(&id).is_dir());

        rollback.execute();
        assert!(!store.container_dir(&id).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_create_container_bundle() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let id = ContainerId::random();
        let rootfs_src = make_rootfs(temp.path()).await?;

        let handle = store.create_container(&id, None).await?;
        store
            .create_container_bundle(&id, b"{\"ociVersion\":\"1.0.2\"}", &rootfs_src)
            .await?;

        assert_eq!(
            fs::read_to_string(handle.rootfs_dir().join("hello.txt")).await?,
            "hello"
        );
        assert!(handle.rootfs_dir().join("bin/sh").is_file());
        assert_eq!(
            fs::read(handle.runtime_spec_file()).await?,
            b"{\"ociVersion\":\"1.0.2\"}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_store_create_container_bundle_requires_container() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let rootfs_src = make_rootfs(temp.path()).await?;

        assert!(matches!(
            store
                .create_container_bundle(&ContainerId::random(), b"{}", &rootfs_src)
                .await,
            Err(MonoboxError::ContainerNotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_state_document_write_read_delete() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let id = ContainerId::random();
        let handle = store.create_container(&id, None).await?;

        store.container_state_write_atomic(&id, b"{\"v\":1}").await?;
        assert_eq!(store.container_state_read(&id).await?, b"{\"v\":1}");

        // Replacing leaves no temp file behind
        store.container_state_write_atomic(&id, b"{\"v\":2}").await?;
        assert_eq!(store.container_state_read(&id).await?, b"{\"v\":2}");
        let mut entries = fs::read_dir(handle.get_container_dir()).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![STATE_FILENAME.to_string()]);

        store.container_state_delete_atomic(&id).await?;
        assert!(!handle.state_file().exists());
        assert!(handle.get_container_dir().is_dir());
        assert!(store.container_state_read(&id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_delete_container_is_idempotent() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());
        let id = ContainerId::random();
        store.create_container(&id, None).await?;

        store.delete_container(&id).await?;
        assert!(!store.container_dir(&id).exists());
        store.delete_container(&id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_store_find_containers_skips_foreign_entries() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ContainerStore::new(temp.path());

        // Fresh store: no containers directory yet
        assert!(store.find_containers().await?.is_empty());

        let first = ContainerId::random();
        let second = ContainerId::random();
        store.create_container(&first, None).await?;
        store.create_container(&second, None).await?;

        // Neither a stray file nor a non-id directory should come back
        fs::create_dir_all(store.containers_dir().join("not-a-container-id")).await?;
        fs::write(store.containers_dir().join("README"), "hi").await?;

        let mut found: Vec<ContainerId> = store
            .find_containers()
            .await?
            .into_iter()
            .map(|handle| handle.get_container_id().clone())
            .collect();
        found.sort();
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(found, expected);
        Ok(())
    }
}
