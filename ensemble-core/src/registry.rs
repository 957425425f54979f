//! Name-keyed process registry: the supervisor core.
//!
//! # Invariants
//!
//! - One handle per name. Registering an existing name fails and leaves the
//!   filed handle alone.
//! - Restart is replace-not-restart: [`ProcessRegistry::terminate_and_replace`]
//!   retires the old handle and files a new `Created` one built from the same
//!   unit, in one step under the map lock.
//! - Every operation takes the lock for its whole duration, so readers never
//!   see a half-replaced entry. `start` holds it across the settle wait, which
//!   is bounded by the configured settle timeout.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::SupervisorError;
use crate::handle::ProcessHandle;
use crate::types::{HandleState, HandleSummary, Settle, WorkerName};
use crate::unit::SharedUnit;

/// Default settle window after a launch.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Inner {
    handles: BTreeMap<WorkerName, ProcessHandle>,
    next_generation: u64,
}

impl Inner {
    fn new_handle(&mut self, name: WorkerName, unit: SharedUnit) -> ProcessHandle {
        self.next_generation += 1;
        ProcessHandle::new(name, self.next_generation, unit)
    }

    fn handle_mut(&mut self, name: &WorkerName) -> Result<&mut ProcessHandle, SupervisorError> {
        self.handles
            .get_mut(name)
            .ok_or_else(|| SupervisorError::NotFound { name: name.clone() })
    }
}

#[derive(Debug)]
pub struct ProcessRegistry {
    inner: Mutex<Inner>,
    settle_timeout: Duration,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_TIMEOUT)
    }
}

impl ProcessRegistry {
    pub fn new(settle_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                handles: BTreeMap::new(),
                next_generation: 0,
            }),
            settle_timeout,
        }
    }

    pub fn settle_timeout(&self) -> Duration {
        self.settle_timeout
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// File a new `Created` handle wrapping `unit` under `name`.
    pub fn register(&self, name: WorkerName, unit: SharedUnit) -> Result<(), SupervisorError> {
        unit.validate()
            .map_err(|reason| SupervisorError::InvalidUnit {
                name: name.clone(),
                reason,
            })?;

        let mut inner = self.lock();
        if inner.handles.contains_key(&name) {
            return Err(SupervisorError::DuplicateName { name });
        }
        let handle = inner.new_handle(name.clone(), unit);
        tracing::debug!(worker = %name, command = %handle.unit().describe(), "worker registered");
        inner.handles.insert(name, handle);
        Ok(())
    }

    /// Register every unit in order, stopping at the first failure.
    ///
    /// Registrations made before the failure stay in place.
    pub fn populate<I>(&self, units: I) -> Result<usize, SupervisorError>
    where
        I: IntoIterator<Item = (WorkerName, SharedUnit)>,
    {
        let mut count = 0;
        for (name, unit) in units {
            self.register(name, unit)?;
            count += 1;
        }
        tracing::info!(count, "registry populated");
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, name: &WorkerName) -> Result<HandleSummary, SupervisorError> {
        let inner = self.lock();
        inner
            .handles
            .get(name)
            .map(ProcessHandle::summary)
            .ok_or_else(|| SupervisorError::NotFound { name: name.clone() })
    }

    pub fn list(&self) -> BTreeMap<WorkerName, HandleSummary> {
        let inner = self.lock();
        inner
            .handles
            .iter()
            .map(|(name, handle)| (name.clone(), handle.summary()))
            .collect()
    }

    pub fn names(&self) -> Vec<WorkerName> {
        self.lock().handles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Launch the worker filed under `name`, then wait out the settle window.
    pub fn start(&self, name: &WorkerName) -> Result<Settle, SupervisorError> {
        let mut inner = self.lock();
        let handle = inner.handle_mut(name)?;

        match handle.state() {
            HandleState::Created => {}
            HandleState::Running => {
                return Err(SupervisorError::AlreadyRunning {
                    name: name.clone(),
                    pid: handle.pid().unwrap_or_default(),
                });
            }
            state @ HandleState::Terminated => {
                return Err(SupervisorError::InvalidState {
                    name: name.clone(),
                    state,
                    operation: "start",
                });
            }
        }

        handle.launch()?;
        let outcome = handle.await_settle(self.settle_timeout);
        if let Settle::Exited(status) = outcome {
            if status.success() {
                tracing::info!(worker = %name, %status, "worker finished within settle window");
            } else {
                tracing::warn!(worker = %name, %status, "worker exited during settle window");
            }
        }
        Ok(outcome)
    }

    /// Terminate the current handle and file a fresh `Created` one built from
    /// the same unit. Does not wait for the old process to exit.
    pub fn terminate_and_replace(&self, name: &WorkerName) -> Result<(), SupervisorError> {
        let mut inner = self.lock();
        let old = inner.handle_mut(name)?;
        old.terminate();
        let unit = old.unit().clone();
        let retired = old.generation();

        let replacement = inner.new_handle(name.clone(), unit);
        tracing::info!(
            worker = %name,
            retired,
            generation = replacement.generation(),
            "worker handle replaced",
        );
        inner.handles.insert(name.clone(), replacement);
        Ok(())
    }

    /// Terminate every running worker. Returns how many were signalled.
    ///
    /// Handles stay filed; the registry is expected to be dropped afterwards.
    pub fn shutdown(&self) -> usize {
        let mut inner = self.lock();
        let mut stopped = 0;
        for handle in inner.handles.values_mut() {
            if handle.state() == HandleState::Running {
                handle.terminate();
                stopped += 1;
            }
        }
        tracing::info!(stopped, "registry shut down");
        stopped
    }

    // A panic while holding the lock cannot leave a handle half-replaced:
    // replacement is a single insert.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::CommandUnit;
    use std::sync::Arc;

    fn unit() -> SharedUnit {
        CommandUnit::new("sh").args(["-c", "sleep 30"]).shared()
    }

    #[test]
    fn default_settle_timeout_is_one_second() {
        assert_eq!(ProcessRegistry::default().settle_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn generations_increase_across_registrations() {
        let registry = ProcessRegistry::default();
        registry.register(WorkerName::from("a"), unit()).expect("a");
        registry.register(WorkerName::from("b"), unit()).expect("b");
        let a = registry.get(&WorkerName::from("a")).expect("get a");
        let b = registry.get(&WorkerName::from("b")).expect("get b");
        assert!(b.generation > a.generation);
    }

    #[test]
    fn invalid_unit_is_not_filed() {
        let registry = ProcessRegistry::default();
        let err = registry
            .register(WorkerName::from("bad"), CommandUnit::new("").shared())
            .unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidUnit { .. }), "got: {err}");
        assert!(registry.is_empty());
    }

    #[test]
    fn populate_is_fail_fast_without_rollback() {
        let registry = ProcessRegistry::default();
        let shared = unit();
        let err = registry
            .populate(vec![
                (WorkerName::from("a"), shared.clone()),
                (WorkerName::from("a"), shared.clone()),
                (WorkerName::from("c"), shared),
            ])
            .unwrap_err();
        assert!(matches!(err, SupervisorError::DuplicateName { .. }), "got: {err}");
        assert_eq!(registry.names(), vec![WorkerName::from("a")]);
    }

    #[test]
    fn replace_keeps_same_unit_on_idle_handle() {
        let registry = ProcessRegistry::default();
        let shared = unit();
        registry.register(WorkerName::from("a"), shared.clone()).expect("register");
        registry.terminate_and_replace(&WorkerName::from("a")).expect("replace");
        let summary = registry.get(&WorkerName::from("a")).expect("get");
        assert_eq!(summary.state, HandleState::Created);
        assert!(Arc::ptr_eq(&summary.unit, &shared));
    }
}
