//! # Pooled-executor service.
//!
//! `start` packages the lifecycle into a [`Job`] and hands it to an
//! [`Executor`] owned by the caller. The service never creates, resizes or
//! shuts down the pool; it only observes the run's completion.
//!
//! ## Rules
//! - The job owns the run. If the executor rejects it (or accepts and later
//!   drops it unexecuted), dropping the job returns the service to idle.
//! - A rejection is reported as [`ServiceError::Rejected`] and no hook runs.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::core::{ServiceCore, run_lifecycle};
use crate::error::ServiceError;
use crate::events::Bus;
use crate::services::Service;
use crate::tasks::{Task, TaskRef};

/// A unit of work submitted to an [`Executor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool able to run blocking jobs.
///
/// Implemented for [`tokio::runtime::Handle`]: jobs go to the runtime's
/// blocking pool.
pub trait Executor: Send + Sync + 'static {
    /// Submits `job`. An `Err` means the job will never run.
    fn execute(&self, job: Job) -> Result<(), Box<dyn StdError + Send + Sync>>;
}

impl Executor for Handle {
    fn execute(&self, job: Job) -> Result<(), Box<dyn StdError + Send + Sync>> {
        // A runtime that is shutting down drops the job, which releases the run.
        drop(self.spawn_blocking(job));
        Ok(())
    }
}

/// Runs a [`Task`] as a job on an external [`Executor`].
///
/// ```rust
/// use std::time::Duration;
/// use taskservice::{ExecutorService, Service, TaskFn};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let svc = ExecutorService::new(rt.handle().clone());
/// svc.start(TaskFn::arc("job", |_| Ok(()))).unwrap();
/// assert!(svc.wait(Duration::from_secs(5)));
/// ```
pub struct ExecutorService<X: Executor = Handle> {
    core: ServiceCore<dyn Task>,
    executor: X,
}

impl<X: Executor> ExecutorService<X> {
    /// Idle service submitting runs to `executor`, which it does not own.
    pub fn new(executor: X) -> Self {
        Self {
            core: ServiceCore::new("executor-service"),
            executor,
        }
    }

    /// Sets the service name used in logs and events.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.core.set_name(name);
        self
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.core.set_bus(bus);
        self
    }

    /// The executor jobs are submitted to.
    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Submits `task`'s lifecycle to the executor and returns immediately.
    ///
    /// # Errors
    /// - [`ServiceError::AlreadyRunning`] if another run is in flight.
    /// - [`ServiceError::Rejected`] if the executor refused the job; the
    ///   service is idle again.
    pub fn start(&self, task: TaskRef) -> Result<&Self, ServiceError> {
        let guard = self.core.begin(task)?;
        let ctx = self.core.context();

        let job: Job = Box::new(move || {
            run_lifecycle(&**guard.task(), guard.signal(), &ctx);
            drop(guard);
        });
        self.executor.execute(job).map_err(|reason| {
            tracing::warn!(service = self.core.name(), error = %reason, "executor rejected run");
            ServiceError::Rejected {
                service: self.core.name().to_string(),
                reason: reason.to_string(),
            }
        })?;
        Ok(self)
    }
}

impl<X: Executor> Service for ExecutorService<X> {
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
