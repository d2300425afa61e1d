use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{MonoboxError, MonoboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The lifecycle status of a container.
///
/// Transitions only move forward: `Initial` → `Created` → `Running` →
/// `Stopped`. `Unknown` is a reconciliation sentinel and is never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created in memory, not yet registered anywhere.
    #[default]
    Initial,

    /// The runtime has created the container; its process has not started.
    Created,

    /// The container's process is running.
    Running,

    /// The container's process has exited.
    Stopped,

    /// The status could not be determined.
    Unknown,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for ContainerStatus {
    type Err = MonoboxError;

    /// Maps a runtime-reported status string. Only the three externally
    /// observable statuses are accepted; anything else means reconciliation
    /// failed and surfaces as an error.
    fn from_str(s: &str) -> MonoboxResult<Self> {
        match s {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            _ => Err(MonoboxError::UnknownContainerStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initial => "initial",
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_status_from_str_accepts_observable_statuses() -> anyhow::Result<()> {
        assert_eq!(
            "created".parse::<ContainerStatus>()?,
            ContainerStatus::Created
        );
        assert_eq!(
            "running".parse::<ContainerStatus>()?,
            ContainerStatus::Running
        );
        assert_eq!(
            "stopped".parse::<ContainerStatus>()?,
            ContainerStatus::Stopped
        );
        Ok(())
    }

    #[test]
    fn test_container_status_from_str_rejects_everything_else() {
        for input in ["", "initial", "unknown", "paused", "Running", "CREATED"] {
            assert!(
                input.parse::<ContainerStatus>().is_err(),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_container_status_display_round_trip() -> anyhow::Result<()> {
        for status in [
            ContainerStatus::Created,
            ContainerStatus::Running,
            ContainerStatus::Stopped,
        ] {
            assert_eq!(status.to_string().parse::<ContainerStatus>()?, status);
        }
        Ok(())
    }

    #[test]
    fn test_container_status_serde_tokens() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&ContainerStatus::Created)?, "\"created\"");
        assert_eq!(serde_json::to_string(&ContainerStatus::Running)?, "\"running\"");
        assert_eq!(serde_json::to_string(&ContainerStatus::Stopped)?, "\"stopped\"");

        let status: ContainerStatus = serde_json::from_str("\"stopped\"")?;
        assert_eq!(status, ContainerStatus::Stopped);
        Ok(())
    }
}
