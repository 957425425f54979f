//! Operator command grammar: `<verb> [<target>]`, one per line.

use ensemble_core::WorkerName;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `enable <name>` — start the worker.
    Enable(WorkerName),
    /// `disable <name>` — terminate the worker and re-file a fresh handle.
    Disable(WorkerName),
    /// `list` — show every worker and its state.
    List,
}

impl ConsoleCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            ConsoleCommand::Enable(_) => "enable",
            ConsoleCommand::Disable(_) => "disable",
            ConsoleCommand::List => "list",
        }
    }
}

/// Parse one input line.
///
/// Returns `Ok(None)` for a blank line. Tokens after the target are ignored.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };

    let target = |tokens: &mut std::str::SplitWhitespace<'_>| {
        tokens
            .next()
            .map(WorkerName::from)
            .ok_or_else(|| CommandError::MalformedCommand {
                verb: verb.to_string(),
            })
    };

    let command = match verb {
        "enable" => ConsoleCommand::Enable(target(&mut tokens)?),
        "disable" => ConsoleCommand::Disable(target(&mut tokens)?),
        "list" => ConsoleCommand::List,
        other => {
            return Err(CommandError::UnknownVerb {
                verb: other.to_string(),
            })
        }
    };
    Ok(Some(command))
}
