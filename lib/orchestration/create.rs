use std::path::PathBuf;

use chrono::Utc;
use getset::Getters;
use typed_builder::TypedBuilder;

use crate::{
    container::{Container, ContainerId, ContainerStatus},
    oci,
    rollback::Rollback,
    MonoboxResult,
};

use super::{Orchestrator, CREATE_TIMEOUT};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What to create a container from.
#[derive(Clone, Debug, Getters, TypedBuilder)]
#[getset(get = "pub with_prefix")]
pub struct ContainerOptions {
    /// Unique human-facing name.
    #[builder(setter(into))]
    name: String,

    /// Program to execute inside the container.
    #[builder(setter(into))]
    command: String,

    /// Arguments handed to the program.
    #[builder(default)]
    args: Vec<String>,

    /// Directory copied into the bundle as the container's rootfs.
    #[builder(setter(into))]
    rootfs_path: PathBuf,

    /// Mount the rootfs read-only.
    #[builder(default)]
    rootfs_readonly: bool,

    /// Keep the container's stdin open for attaching.
    #[builder(default)]
    stdin: bool,

    /// Close stdin once the first attached client detaches.
    #[builder(default)]
    stdin_once: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Creates a container: registers it, lays down its directory and
    /// bundle, persists the state document and hands the bundle to the
    /// runtime.
    ///
    /// Every completed step registers a compensation; on any later
    /// failure the compensations run in order and no trace of the
    /// container remains. On success the returned container is in the
    /// `Created` status.
    pub async fn create_container(
        &mut self,
        options: ContainerOptions,
    ) -> MonoboxResult<Container> {
        let mut rollback = Rollback::new();
        match self.try_create_container(options, &mut rollback).await {
            Ok(container) => {
                tracing::info!(
                    "created container {} ({})",
                    container.get_id(),
                    container.get_name()
                );
                Ok(container)
            }
            Err(err) => {
                tracing::warn!(
                    "create failed, rolling back {} completed steps: {}",
                    rollback.len(),
                    err
                );
                rollback.execute();
                Err(err)
            }
        }
    }

    async fn try_create_container(
        &mut self,
        options: ContainerOptions,
        rollback: &mut Rollback,
    ) -> MonoboxResult<Container> {
        let id = ContainerId::random();
        let log_file = self.container_log_file(&id);

        let mut container = Container::new(
            id.clone(),
            options.get_name().clone(),
            options.get_command().clone(),
            options.get_args().clone(),
            options.get_rootfs_path().clone(),
            log_file.clone(),
        )?;
        container.set_created_at(Utc::now())?;

        self.cmap.add(container.clone(), Some(&mut *rollback))?;
        let handle = self
            .cstore
            .create_container(&id, Some(&mut *rollback))
            .await?;

        let spec = oci::runtime_spec(
            options.get_command(),
            options.get_args(),
            handle.rootfs_dir(),
            *options.get_rootfs_readonly(),
        )?;
        self.cstore
            .create_container_bundle(&id, &spec, options.get_rootfs_path())
            .await?;

        self.transition_container(&mut container, ContainerStatus::Created)
            .await?;

        let pid = self
            .runtime
            .create_container(
                &id,
                &handle.bundle_dir(),
                &log_file,
                &self.container_exit_file(&id),
                &self.container_attach_file(&id),
                *options.get_stdin(),
                *options.get_stdin_once(),
                CREATE_TIMEOUT,
            )
            .await?;

        tracing::debug!("runtime created container {} with PID {}", id, pid);
        Ok(container)
    }
}
