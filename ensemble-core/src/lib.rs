//! Ensemble core library — worker units, process handles, the registry.
//!
//! Public API surface:
//! - [`unit`] — [`WorkerUnit`] capability and the [`CommandUnit`] implementation
//! - [`handle`] — [`ProcessHandle`], one supervised OS process
//! - [`registry`] — [`ProcessRegistry`], name → handle with replace-not-restart
//! - [`error`] — [`SupervisorError`]

pub mod error;
pub mod handle;
pub mod registry;
pub mod types;
pub mod unit;

pub use error::SupervisorError;
pub use handle::ProcessHandle;
pub use registry::{ProcessRegistry, DEFAULT_SETTLE_TIMEOUT};
pub use types::{HandleState, HandleSummary, Settle, WorkerName};
pub use unit::{CommandUnit, SharedUnit, WorkerUnit};
