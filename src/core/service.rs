//! # State shared by every service variant.
//!
//! [`ServiceCore`] bundles what all variants have in common: the service
//! name, the [`RunSlot`] and the optional [`Bus`]. Variants differ only in
//! *where* they drive the lifecycle (caller thread, new thread, executor,
//! async task); claiming, stopping and waiting are identical.

use std::sync::Arc;
use std::time::Duration;

use super::runner::RunContext;
use super::slot::{Run, RunGuard, RunSlot};
use crate::error::ServiceError;
use crate::events::{Bus, EventKind};

pub(crate) struct ServiceCore<T: ?Sized> {
    name: Arc<str>,
    slot: Arc<RunSlot<T>>,
    bus: Option<Bus>,
}

impl<T: ?Sized> ServiceCore<T> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            slot: RunSlot::new(),
            bus: None,
        }
    }

    pub(crate) fn set_name(&mut self, name: impl Into<Arc<str>>) {
        self.name = name.into();
    }

    pub(crate) fn set_bus(&mut self, bus: Bus) {
        self.bus = Some(bus);
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Claims the slot or reports that a run is already in flight.
    pub(crate) fn begin(&self, task: Arc<T>) -> Result<RunGuard<T>, ServiceError> {
        self.slot.begin(task).ok_or_else(|| {
            tracing::warn!(service = %self.name, "start refused: already running");
            ServiceError::AlreadyRunning {
                service: self.name.to_string(),
            }
        })
    }

    pub(crate) fn context(&self) -> RunContext {
        RunContext::new(Arc::clone(&self.name), self.bus.clone())
    }

    /// Raises the signal of the active run and returns it, or `None` when idle.
    ///
    /// Only the loaded run is signalled: if it finishes concurrently, the
    /// next run still starts with a cleared signal. The caller invokes the
    /// task's `stop_requested` hook on the returned run.
    pub(crate) fn request_stop(&self, task_name: impl Fn(&T) -> &str) -> Option<Arc<Run<T>>> {
        let run = self.slot.current()?;
        run.signal().signal();
        tracing::debug!(service = %self.name, "stop requested");
        self.context()
            .publish(EventKind::StopRequested, task_name(&**run.task()));
        Some(run)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    /// `Duration::ZERO` waits without a bound.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let timeout = (timeout > Duration::ZERO).then_some(timeout);
        self.slot.wait(timeout)
    }
}
