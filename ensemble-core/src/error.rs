//! Error types for ensemble-core.

use thiserror::Error;

use crate::types::{HandleState, WorkerName};

/// All errors that can arise from registry and handle operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A handle is already filed under this name; the existing one is kept.
    #[error("worker '{name}' is already registered")]
    DuplicateName { name: WorkerName },

    /// No handle is filed under this name.
    #[error("no worker named '{name}'")]
    NotFound { name: WorkerName },

    /// The unit failed its runnable-capability check.
    #[error("worker '{name}' is not runnable: {reason}")]
    InvalidUnit { name: WorkerName, reason: String },

    #[error("worker '{name}' is already running (pid {pid})")]
    AlreadyRunning { name: WorkerName, pid: u32 },

    /// Operation not allowed from the handle's current lifecycle state.
    #[error("cannot {operation} worker '{name}' while it is {state}")]
    InvalidState {
        name: WorkerName,
        state: HandleState,
        operation: &'static str,
    },

    /// The OS refused to spawn the worker's process.
    #[error("failed to spawn worker '{name}': {source}")]
    Spawn {
        name: WorkerName,
        #[source]
        source: std::io::Error,
    },
}
