use thiserror::Error;

/// Error surface for the console runtime.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("I/O error on {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}

/// A line the operator typed that does not form a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{verb}'")]
    UnknownVerb { verb: String },

    #[error("missing worker name (usage: {verb} <name>)")]
    MalformedCommand { verb: String },
}

impl CommandError {
    pub fn verb(&self) -> &str {
        match self {
            CommandError::UnknownVerb { verb } | CommandError::MalformedCommand { verb } => verb,
        }
    }
}

pub(crate) fn io_err(context: &'static str, source: std::io::Error) -> ConsoleError {
    ConsoleError::Io { context, source }
}
