//! Domain types for the Ensemble supervisor.
//!
//! Names are strongly typed; handle states form a one-way lifecycle.

use std::fmt;
use std::process::ExitStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::unit::SharedUnit;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a worker entry in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerName(pub String);

impl WorkerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkerName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle state of one process handle.
///
/// Transitions only move forward: `Created → Running → Terminated`. A
/// terminated handle is never revived; the registry files a new one instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandleState {
    #[default]
    Created,
    Running,
    Terminated,
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleState::Created => write!(f, "created"),
            HandleState::Running => write!(f, "running"),
            HandleState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Result of the bounded wait that follows a launch.
///
/// Neither variant is an error: a worker that finishes its job quickly and a
/// worker that crashes on start both come back as `Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The settle window elapsed with the process still alive.
    StillRunning,
    /// The process exited inside the settle window.
    Exited(ExitStatus),
}

impl Settle {
    pub fn is_running(&self) -> bool {
        matches!(self, Settle::StillRunning)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only view of the handle currently filed under a name.
#[derive(Debug, Clone, Serialize)]
pub struct HandleSummary {
    pub name: WorkerName,
    /// Registry-unique handle identity; a replacement always gets a new one.
    pub generation: u64,
    pub state: HandleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub command: String,
    #[serde(skip)]
    pub unit: SharedUnit,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(WorkerName::from("ticker").to_string(), "ticker");
        assert_eq!(WorkerName::from("ticker").as_str(), "ticker");
    }

    #[test]
    fn newtype_equality() {
        let a = WorkerName::from("x");
        let b = WorkerName::from(String::from("x"));
        assert_eq!(a, b);
    }

    #[test]
    fn worker_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&WorkerName::from("ticker")).expect("serialize");
        assert_eq!(json, "\"ticker\"");
    }

    #[test]
    fn handle_state_display() {
        assert_eq!(HandleState::Created.to_string(), "created");
        assert_eq!(HandleState::Running.to_string(), "running");
        assert_eq!(HandleState::Terminated.to_string(), "terminated");
        assert_eq!(HandleState::default(), HandleState::Created);
    }
}
