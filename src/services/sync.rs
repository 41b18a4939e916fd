//! # Synchronous service: the lifecycle runs on the caller's thread.
//!
//! `start` blocks until `uninit` has completed. Another thread holding a
//! reference to the service can `stop` it or `wait` on the same run.

use std::time::Duration;

use crate::core::{ServiceCore, run_lifecycle};
use crate::error::ServiceError;
use crate::events::Bus;
use crate::services::Service;
use crate::tasks::{Task, TaskRef};

/// Runs a [`Task`] inline on the thread that calls [`start`](SyncService::start).
///
/// ```rust
/// use taskservice::{Service, SyncService, TaskFn};
///
/// let svc = SyncService::new();
/// svc.start(TaskFn::arc("inline", |_| Ok(()))).unwrap();
/// assert!(!svc.is_running());
/// ```
pub struct SyncService {
    core: ServiceCore<dyn Task>,
}

impl SyncService {
    /// Idle service named `sync-service`; runs execute on the thread calling `start`.
    pub fn new() -> Self {
        Self {
            core: ServiceCore::new("sync-service"),
        }
    }

    /// Sets the service name used in logs and events.
    pub fn with_name(mut self, name: impl Into<std::sync::Arc<str>>) -> Self {
        self.core.set_name(name);
        self
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.core.set_bus(bus);
        self
    }

    /// Runs `task` to completion on the current thread.
    ///
    /// # Errors
    /// [`ServiceError::AlreadyRunning`] if another run is in flight; the
    /// in-flight run is not affected. Task failures go to the task's
    /// `on_error`, never here.
    pub fn start(&self, task: TaskRef) -> Result<&Self, ServiceError> {
        let guard = self.core.begin(task)?;
        run_lifecycle(&**guard.task(), guard.signal(), &self.core.context());
        drop(guard);
        Ok(self)
    }
}

impl Default for SyncService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for SyncService {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn stop(&self) {
        if let Some(run) = self.core.request_stop(|t| t.name()) {
            run.task().stop_requested();
        }
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn wait(&self, timeout: Duration) -> bool {
        self.core.wait(timeout)
    }
}
