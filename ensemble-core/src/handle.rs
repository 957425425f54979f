//! One supervised OS process.
//!
//! A handle is built in `Created`, moves to `Running` on [`ProcessHandle::launch`]
//! and ends in `Terminated`. It never goes back: the registry files a fresh
//! handle built from the same unit instead.

use std::process::{Child, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::SupervisorError;
use crate::types::{HandleState, HandleSummary, Settle, WorkerName};
use crate::unit::SharedUnit;

const SETTLE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct ProcessHandle {
    name: WorkerName,
    generation: u64,
    unit: SharedUnit,
    state: HandleState,
    child: Option<Child>,
    started_at: Option<DateTime<Utc>>,
}

impl ProcessHandle {
    pub fn new(name: WorkerName, generation: u64, unit: SharedUnit) -> Self {
        Self {
            name,
            generation,
            unit,
            state: HandleState::Created,
            child: None,
            started_at: None,
        }
    }

    pub fn name(&self) -> &WorkerName {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// The retained unit; used to build a replacement handle.
    pub fn unit(&self) -> &SharedUnit {
        &self.unit
    }

    /// OS process id, only while `Running`.
    pub fn pid(&self) -> Option<u32> {
        match self.state {
            HandleState::Running => self.child.as_ref().map(Child::id),
            _ => None,
        }
    }

    pub fn summary(&self) -> HandleSummary {
        HandleSummary {
            name: self.name.clone(),
            generation: self.generation,
            state: self.state,
            pid: self.pid(),
            started_at: self.started_at,
            command: self.unit.describe(),
            unit: self.unit.clone(),
        }
    }

    /// Spawn the unit's process. Only valid from `Created`.
    ///
    /// stdin is detached so workers never compete with the operator console
    /// for terminal input. On a spawn failure the handle stays `Created`.
    pub fn launch(&mut self) -> Result<u32, SupervisorError> {
        if self.state != HandleState::Created {
            return Err(SupervisorError::InvalidState {
                name: self.name.clone(),
                state: self.state,
                operation: "launch",
            });
        }

        let mut command = self.unit.command();
        // Own process group, so terminate reaches the worker's children too
        // and a terminal ctrl-c only reaches the supervisor.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                name: self.name.clone(),
                source,
            })?;

        let pid = child.id();
        self.child = Some(child);
        self.started_at = Some(Utc::now());
        self.state = HandleState::Running;
        tracing::info!(worker = %self.name, pid, generation = self.generation, "worker launched");
        Ok(pid)
    }

    /// Block for at most `timeout`, returning early if the process exits.
    ///
    /// Timing out is the normal outcome. A handle without a live child
    /// returns `StillRunning` immediately.
    pub fn await_settle(&mut self, timeout: Duration) -> Settle {
        let Some(child) = self.child.as_mut() else {
            return Settle::StillRunning;
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(worker = %self.name, %status, "worker exited during settle");
                    return Settle::Exited(status);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(worker = %self.name, error = %err, "settle wait failed");
                    return Settle::StillRunning;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Settle::StillRunning;
            }
            sleep(SETTLE_POLL.min(deadline - now));
        }
    }

    /// Ask the OS to stop the process and its process group. Idempotent.
    ///
    /// Does not wait for the process to exit: the child is reaped on a
    /// detached thread. Always leaves the handle `Terminated`.
    pub fn terminate(&mut self) {
        let previous = self.state;
        self.state = HandleState::Terminated;

        let Some(mut child) = self.child.take() else {
            if previous != HandleState::Terminated {
                tracing::debug!(worker = %self.name, state = %previous, "terminate on idle handle");
            }
            return;
        };

        // An exited child is already reaped by try_wait; its pid may be reused.
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!(worker = %self.name, %status, "worker had already exited");
                return;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(worker = %self.name, error = %err, "could not poll worker before terminate");
            }
        }

        let pid = child.id();
        if let Err(err) = request_stop(&mut child) {
            tracing::warn!(worker = %self.name, pid, error = %err, "failed to signal worker");
        } else {
            tracing::info!(worker = %self.name, pid, "worker terminated");
        }
        reap_detached(&self.name, child);
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // The worker leads its own group (see `launch`).
    match killpg(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(std::io::Error::from(errno)),
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) -> std::io::Result<()> {
    match child.kill() {
        Err(err) if err.kind() != std::io::ErrorKind::InvalidInput => Err(err),
        _ => Ok(()),
    }
}

fn reap_detached(name: &WorkerName, mut child: Child) {
    let worker = name.clone();
    let spawned = std::thread::Builder::new()
        .name(format!("reap-{name}"))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!(worker = %worker, %status, "worker reaped"),
            Err(err) => tracing::warn!(worker = %worker, error = %err, "failed to reap worker"),
        });
    if let Err(err) = spawned {
        tracing::warn!(worker = %name, error = %err, "could not start reaper thread");
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
