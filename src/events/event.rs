//! # Lifecycle events emitted by services.
//!
//! The [`EventKind`] enum classifies service lifecycle transitions. The
//! [`Event`] struct carries metadata such as timestamps, service and task
//! names, the failing [`Stage`] and error text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Within one run, events are published in this order:
//!
//! ```text
//! ServiceStarting → [StopRequested] → [RunCanceled] → [TaskFailed]* → ServiceStopped
//! ```
//!
//! `ServiceStopped` is published before the service returns to idle, so a
//! receiver that sees it knows `uninit` has already completed.
//!
//! ## Example
//! ```rust
//! use taskservice::{Event, EventKind, Stage};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_service("worker")
//!     .with_task("ticker")
//!     .with_stage(Stage::Run)
//!     .with_error("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.service.as_deref(), Some("worker"));
//! assert_eq!(ev.stage, Some(Stage::Run));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A run was accepted and is about to call `init`.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `task`: task name
    ServiceStarting,

    /// `stop` was called while a run was in flight.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `task`: task name
    StopRequested,

    /// A hook failed; published once per error, before the error hook runs.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `task`: task name
    /// - `stage`: hook that failed
    /// - `error`: failure message
    TaskFailed,

    /// The enclosing cancellation scope of a cooperative run was cancelled.
    ///
    /// Not an error; `uninit` still follows.
    RunCanceled,

    /// The run finished (`uninit` done); the service is about to become idle.
    ServiceStopped,
}

/// Lifecycle hook in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `init`
    Init,
    /// `run`
    Run,
    /// `uninit`
    Uninit,
}

impl Stage {
    /// Returns a short stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Run => "run",
            Stage::Uninit => "uninit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the service that published the event.
    pub service: Option<Arc<str>>,
    /// Name of the task being run.
    pub task: Option<Arc<str>>,
    /// Failing hook, for `TaskFailed`.
    pub stage: Option<Stage>,
    /// Failure message, for `TaskFailed`.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            task: None,
            stage: None,
            error: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the failing stage.
    #[inline]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }
}
