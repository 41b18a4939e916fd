//! # Drive one lifecycle of a task.
//!
//! Executes `init → run → uninit` for one accepted start, contains panics,
//! routes failures to the task's error hook and publishes lifecycle events.
//!
//! ## Flow
//!
//! ```text
//! publish ServiceStarting
//! init ──Err──┐
//!  │Ok        │
//! run ──Err───┤            (Canceled = graceful, not an error)
//!  │Ok        │
//!  ▼          ▼
//! uninit (always)
//!  ▼
//! on_error(init/run failure), then on_error(uninit failure)
//!  ▼
//! publish ServiceStopped
//! ```
//!
//! ## Rules
//! - `uninit` runs exactly once, whatever happened before.
//! - Every failure is published as `TaskFailed` and handed to `on_error`.
//! - A panicking hook becomes [`TaskError::Panicked`]; a panicking error hook
//!   is logged and swallowed.
//! - Nothing escapes: the service only learns that the run is over.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::slot::RunGuard;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind, Stage};
use crate::signal::Signal;
use crate::tasks::{CoTask, Task};

/// Identity and event sink of the service driving a run.
#[derive(Clone, Debug)]
pub(crate) struct RunContext {
    pub service: Arc<str>,
    pub bus: Option<Bus>,
}

impl RunContext {
    pub(crate) fn new(service: Arc<str>, bus: Option<Bus>) -> Self {
        Self { service, bus }
    }

    pub(crate) fn publish(&self, kind: EventKind, task: &str) {
        if let Some(bus) = &self.bus {
            bus.publish(
                Event::new(kind)
                    .with_service(Arc::clone(&self.service))
                    .with_task(task),
            );
        }
    }

    fn publish_failed(&self, task: &str, stage: Stage, err: &TaskError) {
        tracing::debug!(
            service = %self.service,
            task,
            stage = %stage,
            label = err.as_label(),
            "task hook failed"
        );
        if let Some(bus) = &self.bus {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_service(Arc::clone(&self.service))
                    .with_task(task)
                    .with_stage(stage)
                    .with_error(err.to_string()),
            );
        }
    }
}

fn guarded<F>(f: F) -> Result<(), TaskError>
where
    F: FnOnce() -> Result<(), TaskError>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(TaskError::from_panic(payload)))
}

/// Keeps only real failures; `Canceled` is a graceful exit.
fn failure(res: Result<(), TaskError>, stage: Stage) -> Option<(Stage, TaskError)> {
    match res {
        Ok(()) | Err(TaskError::Canceled) => None,
        Err(e) => Some((stage, e)),
    }
}

/// Runs one blocking lifecycle on the current thread.
pub(crate) fn run_lifecycle<T: Task + ?Sized>(task: &T, signal: &Signal, ctx: &RunContext) {
    let name = task.name();
    ctx.publish(EventKind::ServiceStarting, name);
    tracing::debug!(service = %ctx.service, task = name, "run starting");

    let body = match guarded(|| task.init()) {
        Ok(()) => failure(guarded(|| task.run(signal)), Stage::Run),
        Err(e) => failure(Err(e), Stage::Init),
    };
    let cleanup = failure(guarded(|| task.uninit()), Stage::Uninit);

    for (stage, err) in body.into_iter().chain(cleanup) {
        ctx.publish_failed(name, stage, &err);
        if catch_unwind(AssertUnwindSafe(|| task.on_error(err))).is_err() {
            tracing::error!(service = %ctx.service, task = name, stage = %stage, "error hook panicked");
        }
    }

    ctx.publish(EventKind::ServiceStopped, name);
    tracing::debug!(service = %ctx.service, task = name, "run finished");
}

async fn co_guarded<F>(fut: F) -> Result<(), TaskError>
where
    F: Future<Output = Result<(), TaskError>>,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)))
}

/// Owns a cooperative run from spawn until its lifecycle has completed.
///
/// A runtime that shuts down drops its tasks mid-flight. `uninit` cannot run
/// then; dropping an unfinished `CoRun` still publishes `RunCanceled` and
/// `ServiceStopped` (before the slot is released) and logs the skipped
/// `uninit`. A run dropped before its first poll ran no hook and reports
/// nothing.
pub(crate) struct CoRun {
    guard: RunGuard<dyn CoTask>,
    ctx: RunContext,
    started: bool,
    completed: bool,
}

impl CoRun {
    pub(crate) fn new(guard: RunGuard<dyn CoTask>, ctx: RunContext) -> Self {
        Self {
            guard,
            ctx,
            started: false,
            completed: false,
        }
    }

    /// Drives the lifecycle; the slot is released when `self` drops.
    pub(crate) async fn drive(mut self, scope: CancellationToken) {
        self.started = true;
        run_co_lifecycle(&**self.guard.task(), self.guard.signal(), &scope, &self.ctx).await;
        self.completed = true;
    }
}

impl Drop for CoRun {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let task = self.guard.task().name();
        if !self.started {
            tracing::debug!(service = %self.ctx.service, task, "run dropped before it started");
            return;
        }
        tracing::warn!(
            service = %self.ctx.service,
            task,
            "runtime dropped the run mid-flight; uninit skipped"
        );
        self.ctx.publish(EventKind::RunCanceled, task);
        self.ctx.publish(EventKind::ServiceStopped, task);
    }
}

/// Runs one async lifecycle inside the `scope` cancellation token.
///
/// Cancellation of `scope` drops the pending `init`/`run` future and counts as
/// a normal end of the run; `uninit` is not raced against the scope.
async fn run_co_lifecycle<T: CoTask + ?Sized>(
    task: &T,
    signal: &Signal,
    scope: &CancellationToken,
    ctx: &RunContext,
) {
    let name = task.name();
    ctx.publish(EventKind::ServiceStarting, name);
    tracing::debug!(service = %ctx.service, task = name, "run starting");

    let body = async {
        match co_guarded(task.init()).await {
            Ok(()) => failure(co_guarded(task.run(signal)).await, Stage::Run),
            Err(e) => failure(Err(e), Stage::Init),
        }
    };
    let body = tokio::select! {
        biased;
        _ = scope.cancelled() => {
            ctx.publish(EventKind::RunCanceled, name);
            tracing::debug!(service = %ctx.service, task = name, "scope cancelled");
            None
        }
        res = body => res,
    };
    let cleanup = failure(co_guarded(task.uninit()).await, Stage::Uninit);

    for (stage, err) in body.into_iter().chain(cleanup) {
        ctx.publish_failed(name, stage, &err);
        if co_guarded(async {
            task.on_error(err).await;
            Ok(())
        })
        .await
        .is_err()
        {
            tracing::error!(service = %ctx.service, task = name, stage = %stage, "error hook panicked");
        }
    }

    ctx.publish(EventKind::ServiceStopped, name);
    tracing::debug!(service = %ctx.service, task = name, "run finished");
}
