//! Worker units: the runnable capability a process handle executes.
//!
//! The registry never looks inside a unit. It asks for a [`Command`] when it
//! launches, and keeps the same [`SharedUnit`] around so a terminated worker
//! can be re-filed without going back to the loader.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Something a process handle can execute.
pub trait WorkerUnit: Send + Sync + fmt::Debug {
    /// Build the OS command that runs this unit.
    fn command(&self) -> Command;

    /// Check the runnable-capability contract. `Err` carries the reason.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// One-line description for listings and logs.
    fn describe(&self) -> String;
}

/// Units are shared between the registry and every handle built from them.
pub type SharedUnit = Arc<dyn WorkerUnit>;

/// A unit that runs a program with fixed arguments and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUnit {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandUnit {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Wrap into the shared form the registry stores.
    pub fn shared(self) -> SharedUnit {
        Arc::new(self)
    }
}

impl WorkerUnit for CommandUnit {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn validate(&self) -> Result<(), String> {
        if self.program.as_os_str().is_empty() {
            return Err("program is empty".to_string());
        }
        // Bare names are resolved through PATH at spawn time.
        if has_separator(&self.program) && !self.program.is_file() {
            return Err(format!("program not found: {}", self.program.display()));
        }
        if let Some(dir) = &self.working_dir {
            if !dir.is_dir() {
                return Err(format!("working directory not found: {}", dir.display()));
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

fn has_separator(path: &Path) -> bool {
    path.components().count() > 1 || path.is_absolute()
}
