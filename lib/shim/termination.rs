use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MonoboxError, MonoboxResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Termination reason token for a process that exited on its own.
pub const REASON_EXITED: &str = "exited";

/// Termination reason token for a process killed by a signal.
pub const REASON_SIGNALED: &str = "signaled";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How and when a container's process terminated.
///
/// The shim writes this record to the container's exit file the moment the
/// process goes away; the orchestrator reads it back whenever it observes a
/// stopped container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationStatus {
    /// The process exited on its own with an exit code.
    Exited {
        /// When the process exited.
        at: DateTime<Utc>,
        /// The process's exit code, in `0..=127`.
        exit_code: i32,
    },

    /// The process was killed by a signal.
    Signaled {
        /// When the process was killed.
        at: DateTime<Utc>,
        /// The killing signal number, greater than zero.
        signal: i32,
    },
}

/// The exit file's wire form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TerminationRecord {
    at: DateTime<Utc>,
    #[serde(default)]
    exit_code: i32,
    #[serde(default)]
    signal: i32,
    reason: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl TerminationStatus {
    /// Parses and validates a termination record.
    pub fn from_slice(bytes: &[u8]) -> MonoboxResult<Self> {
        let record: TerminationRecord = serde_json::from_slice(bytes)?;
        match record.reason.as_str() {
            REASON_EXITED => {
                if !(0..=127).contains(&record.exit_code) {
                    return Err(MonoboxError::InvalidTerminationStatus(format!(
                        "exit code out of range: {}",
                        record.exit_code
                    )));
                }
                Ok(Self::Exited {
                    at: record.at,
                    exit_code: record.exit_code,
                })
            }
            REASON_SIGNALED => {
                if record.signal <= 0 {
                    return Err(MonoboxError::InvalidTerminationStatus(format!(
                        "invalid signal: {}",
                        record.signal
                    )));
                }
                Ok(Self::Signaled {
                    at: record.at,
                    signal: record.signal,
                })
            }
            other => Err(MonoboxError::InvalidTerminationStatus(format!(
                "unknown reason: {:?}",
                other
            ))),
        }
    }

    /// Serializes the status back into the exit file's wire form.
    pub fn to_vec(&self) -> MonoboxResult<Vec<u8>> {
        let record = match *self {
            Self::Exited { at, exit_code } => TerminationRecord {
                at,
                exit_code,
                signal: 0,
                reason: REASON_EXITED.to_string(),
            },
            Self::Signaled { at, signal } => TerminationRecord {
                at,
                exit_code: 0,
                signal,
                reason: REASON_SIGNALED.to_string(),
            },
        };
        Ok(serde_json::to_vec(&record)?)
    }

    /// When the process terminated.
    pub fn at(&self) -> DateTime<Utc> {
        match *self {
            Self::Exited { at, .. } | Self::Signaled { at, .. } => at,
        }
    }

    /// Whether the process was killed by a signal.
    pub fn is_signaled(&self) -> bool {
        matches!(self, Self::Signaled { .. })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_parses_exited_record() -> anyhow::Result<()> {
        let status = TerminationStatus::from_slice(
            br#"{"at": "2021-03-07T12:00:00Z", "exitCode": 42, "signal": 0, "reason": "exited"}"#,
        )?;

        assert!(!status.is_signaled());
        assert!(matches!(status, TerminationStatus::Exited { exit_code: 42, .. }));
        Ok(())
    }

    #[test]
    fn test_termination_parses_signaled_record() -> anyhow::Result<()> {
        let status = TerminationStatus::from_slice(
            br#"{"at": "2021-03-07T12:00:00Z", "exitCode": 0, "signal": 9, "reason": "signaled"}"#,
        )?;

        assert!(status.is_signaled());
        assert!(matches!(status, TerminationStatus::Signaled { signal: 9, .. }));
        Ok(())
    }

    #[test]
    fn test_termination_rejects_invalid_records() {
        for (bytes, what) in [
            (br#"{"at": "2021-03-07T12:00:00Z", "exitCode": 0, "signal": 0, "reason": "vanished"}"#.as_slice(), "unknown reason"),
            (br#"{"at": "2021-03-07T12:00:00Z", "exitCode": 128, "signal": 0, "reason": "exited"}"#.as_slice(), "exit code too big"),
            (br#"{"at": "2021-03-07T12:00:00Z", "exitCode": -1, "signal": 0, "reason": "exited"}"#.as_slice(), "negative exit code"),
            (br#"{"at": "2021-03-07T12:00:00Z", "exitCode": 0, "signal": 0, "reason": "signaled"}"#.as_slice(), "zero signal"),
            (br#"{"exitCode": 0, "signal": 9, "reason": "signaled"}"#.as_slice(), "missing timestamp"),
            (b"not json".as_slice(), "not json"),
        ] {
            assert!(
                TerminationStatus::from_slice(bytes).is_err(),
                "expected rejection: {}",
                what
            );
        }
    }

    #[test]
    fn test_termination_wire_round_trip() -> anyhow::Result<()> {
        let status = TerminationStatus::Signaled {
            at: Utc::now(),
            signal: 15,
        };
        let bytes = status.to_vec()?;
        assert_eq!(TerminationStatus::from_slice(&bytes)?, status);

        let doc: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(doc["reason"], "signaled");
        assert_eq!(doc["signal"], 15);
        assert!(doc.get("exitCode").is_some());
        assert!(doc.get("at").is_some());
        Ok(())
    }
}
