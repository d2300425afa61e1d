use std::{path::PathBuf, sync::LazyLock};

use chrono::{DateTime, Utc};
use getset::{Getters, Setters};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{MonoboxError, MonoboxResult};

use super::{ContainerId, ContainerStatus};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The maximum length of a container name.
pub const CONTAINER_NAME_MAX_LEN: usize = 32;

static CONTAINER_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,32}$").unwrap());

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A container as the manager sees it.
///
/// This struct is also the persisted state document: the serialized form is
/// written to `state.json` after every transition and reconciliation, so the
/// field names below are a stable on-disk contract.
///
/// The timestamps are write-once. `finished_at` additionally tolerates being
/// re-set to the same instant because reconciliation re-derives it from the
/// termination record on every query of a stopped container.
#[derive(Clone, Debug, Serialize, Deserialize, Getters, Setters)]
#[getset(get = "pub with_prefix")]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// The container's unique ID.
    id: ContainerId,

    /// The container's unique, human-friendly name.
    name: String,

    /// The container's lifecycle status.
    #[getset(set = "pub with_prefix")]
    status: ContainerStatus,

    /// The exit code recorded once the container stopped.
    #[getset(set = "pub with_prefix")]
    exit_code: i32,

    /// When the container was created.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    created_at: Option<DateTime<Utc>>,

    /// When the container's process was confirmed running.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    started_at: Option<DateTime<Utc>>,

    /// When the container's process exited.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    finished_at: Option<DateTime<Utc>>,

    /// The executable to run inside the container.
    command: String,

    /// Arguments passed to the command.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    args: Vec<String>,

    /// The rootfs the container was created from.
    rootfs_path: PathBuf,

    /// Where the container's output is logged.
    log_path: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Container {
    /// Creates a new container in the `Initial` status.
    ///
    /// Fails with `InvalidContainerName` unless the name is 1-32 characters of
    /// `[A-Za-z0-9_]`.
    pub fn new(
        id: ContainerId,
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        rootfs_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> MonoboxResult<Self> {
        let name = name.into();
        if !CONTAINER_NAME_PATTERN.is_match(&name) {
            return Err(MonoboxError::InvalidContainerName(name));
        }

        Ok(Self {
            id,
            name,
            status: ContainerStatus::Initial,
            exit_code: 0,
            created_at: None,
            started_at: None,
            finished_at: None,
            command: command.into(),
            args,
            rootfs_path: rootfs_path.into(),
            log_path: log_path.into(),
        })
    }

    /// Sets the creation timestamp; errors if it was already set.
    pub fn set_created_at(&mut self, at: DateTime<Utc>) -> MonoboxResult<()> {
        if self.created_at.is_some() {
            return Err(MonoboxError::TimestampAlreadySet("createdAt".to_string()));
        }
        self.created_at = Some(at);
        Ok(())
    }

    /// Sets the start timestamp; errors if it was already set.
    pub fn set_started_at(&mut self, at: DateTime<Utc>) -> MonoboxResult<()> {
        if self.started_at.is_some() {
            return Err(MonoboxError::TimestampAlreadySet("startedAt".to_string()));
        }
        self.started_at = Some(at);
        Ok(())
    }

    /// Sets the finish timestamp; errors if it was already set to a different
    /// instant. Re-setting the same instant is allowed.
    pub fn set_finished_at(&mut self, at: DateTime<Utc>) -> MonoboxResult<()> {
        match self.finished_at {
            Some(existing) if existing != at => {
                Err(MonoboxError::TimestampAlreadySet("finishedAt".to_string()))
            }
            _ => {
                self.finished_at = Some(at);
                Ok(())
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_container(name: &str) -> MonoboxResult<Container> {
        Container::new(
            ContainerId::random(),
            name,
            "/bin/sleep",
            vec!["999".to_string()],
            "/tmp/rootfs",
            "/tmp/logs/c.log",
        )
    }

    #[test]
    fn test_container_name_validation() {
        for name in ["a", "abc", "snake_case_123", "A2", &"x".repeat(32)] {
            assert!(make_container(name).is_ok(), "expected {:?} accepted", name);
        }
        for name in ["", "has space", "has-dash", "dot.dot", &"x".repeat(33)] {
            assert!(
                matches!(
                    make_container(name),
                    Err(MonoboxError::InvalidContainerName(_))
                ),
                "expected {:?} rejected",
                name
            );
        }
    }

    #[test]
    fn test_container_new_defaults() -> anyhow::Result<()> {
        let container = make_container("fresh")?;
        assert_eq!(*container.get_status(), ContainerStatus::Initial);
        assert_eq!(*container.get_exit_code(), 0);
        assert!(container.get_created_at().is_none());
        assert!(container.get_started_at().is_none());
        assert!(container.get_finished_at().is_none());
        Ok(())
    }

    #[test]
    fn test_container_timestamps_are_write_once() -> anyhow::Result<()> {
        let mut container = make_container("stamps")?;
        let at = Utc::now();

        container.set_created_at(at)?;
        assert!(container.set_created_at(at).is_err());

        container.set_started_at(at)?;
        assert!(container.set_started_at(at).is_err());

        Ok(())
    }

    #[test]
    fn test_container_finished_at_tolerates_same_value() -> anyhow::Result<()> {
        let mut container = make_container("finisher")?;
        let at = Utc::now();

        container.set_finished_at(at)?;
        container.set_finished_at(at)?;
        assert!(container
            .set_finished_at(at + chrono::Duration::seconds(1))
            .is_err());

        Ok(())
    }

    #[test]
    fn test_container_state_document_field_names() -> anyhow::Result<()> {
        let mut container = make_container("doc")?;
        container.set_status(ContainerStatus::Stopped);
        container.set_exit_code(7);
        container.set_created_at(Utc::now())?;
        container.set_started_at(Utc::now())?;
        container.set_finished_at(Utc::now())?;

        let doc: serde_json::Value = serde_json::from_slice(&serde_json::to_vec(&container)?)?;
        for field in [
            "id",
            "name",
            "status",
            "exitCode",
            "createdAt",
            "startedAt",
            "finishedAt",
            "command",
            "args",
            "rootfsPath",
            "logPath",
        ] {
            assert!(doc.get(field).is_some(), "missing field {:?}", field);
        }
        assert_eq!(doc["status"], "stopped");
        assert_eq!(doc["exitCode"], 7);
        Ok(())
    }

    #[test]
    fn test_container_unset_timestamps_are_omitted() -> anyhow::Result<()> {
        let container = make_container("sparse")?;
        let doc: serde_json::Value = serde_json::from_slice(&serde_json::to_vec(&container)?)?;
        assert!(doc.get("createdAt").is_none());
        assert!(doc.get("startedAt").is_none());
        assert!(doc.get("finishedAt").is_none());
        Ok(())
    }

    #[test]
    fn test_container_serde_round_trip_is_stable() -> anyhow::Result<()> {
        let mut container = make_container("roundtrip")?;
        container.set_status(ContainerStatus::Running);
        container.set_created_at(Utc::now())?;
        container.set_started_at(Utc::now())?;

        let bytes = serde_json::to_vec(&container)?;
        let restored: Container = serde_json::from_slice(&bytes)?;

        assert_eq!(restored.get_id(), container.get_id());
        assert_eq!(restored.get_name(), container.get_name());
        assert_eq!(restored.get_status(), container.get_status());
        assert_eq!(restored.get_created_at(), container.get_created_at());
        assert_eq!(restored.get_started_at(), container.get_started_at());
        assert_eq!(serde_json::to_vec(&restored)?, bytes);
        Ok(())
    }
}
