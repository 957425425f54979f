//! Operator console: line commands in, registry operations out.

pub mod command;
pub mod config;
pub mod dispatch;
mod error;
mod runtime;

pub use command::{parse_line, ConsoleCommand};
pub use config::{ConsoleConfig, DEFAULT_PROMPT};
pub use dispatch::Dispatcher;
pub use error::{CommandError, ConsoleError};
pub use runtime::{init_tracing, run, run_session, shutdown_signal, start_blocking, SessionEnd};
