//! Maps parsed commands onto registry operations and renders the replies.
//!
//! Every outcome, good or bad, becomes one operator-facing message. Nothing
//! here returns an error to the session loop.

use std::sync::Arc;

use ensemble_core::{HandleState, ProcessRegistry, Settle, SupervisorError, WorkerName};

use crate::command::{parse_line, ConsoleCommand};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ProcessRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProcessRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Parse and execute one input line. `None` for blank input.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        match parse_line(line) {
            Ok(None) => None,
            Ok(Some(command)) => Some(self.execute(&command).unwrap_or_else(|err| {
                tracing::debug!(verb = command.verb(), error = %err, "command failed");
                format!("error: {err}")
            })),
            Err(err) => {
                tracing::debug!(line, error = %err, "rejected input line");
                Some(err.to_string())
            }
        }
    }

    pub fn execute(&self, command: &ConsoleCommand) -> Result<String, SupervisorError> {
        match command {
            ConsoleCommand::Enable(name) => self.enable(name),
            ConsoleCommand::Disable(name) => {
                self.registry.terminate_and_replace(name)?;
                Ok(format!("disabled '{name}'"))
            }
            ConsoleCommand::List => Ok(self.render_list()),
        }
    }

    fn enable(&self, name: &WorkerName) -> Result<String, SupervisorError> {
        let outcome = self.registry.start(name)?;
        let pid = self.registry.get(name)?.pid;
        let pid = pid.map(|p| format!(" (pid {p})")).unwrap_or_default();
        Ok(match outcome {
            Settle::StillRunning => format!("enabled '{name}'{pid}"),
            Settle::Exited(status) => format!("enabled '{name}'{pid}; exited during settle: {status}"),
        })
    }

    fn render_list(&self) -> String {
        let list = self.registry.list();
        if list.is_empty() {
            return "no workers registered".to_string();
        }

        let width = list.keys().map(|n| n.as_str().len()).max().unwrap_or(0);
        list.values()
            .map(|summary| {
                let detail = match (summary.state, summary.pid) {
                    (HandleState::Running, Some(pid)) => format!("pid {pid}"),
                    _ => String::new(),
                };
                format!(
                    "{:<width$}  {:<10}  {}",
                    summary.name.as_str(),
                    summary.state.to_string(),
                    detail,
                )
                .trim_end()
                .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
