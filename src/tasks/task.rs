//! # Blocking task contract.
//!
//! This module defines the [`Task`] trait run by
//! [`SyncService`](crate::SyncService), [`ThreadService`](crate::ThreadService)
//! and [`ExecutorService`](crate::ExecutorService). The common handle type is
//! [`TaskRef`], an `Arc<dyn Task>` so the caller can keep observing a task
//! while a service runs it.
//!
//! A task receives a [`Signal`] and should periodically check it to stop
//! cooperatively.

use std::sync::Arc;

use crate::error::TaskError;
use crate::signal::Signal;

/// Shared handle to a blocking task.
pub type TaskRef = Arc<dyn Task>;

/// # Blocking, cooperatively stoppable unit of work.
///
/// A service calls `init`, then `run`, then `uninit`. `uninit` is always
/// called once per start, even when `init` or `run` failed. Every failure is
/// handed to [`on_error`](Task::on_error) after `uninit`.
///
/// # Example
/// ```
/// use taskservice::{Signal, Task, TaskError};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn run(&self, signal: &Signal) -> Result<(), TaskError> {
///         while !signal.is_signalled() {
///             // do work...
///             # break;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Human-readable name (for logs and events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Prepares the task. Called before `run`.
    fn init(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Does the work until completion or until `signal` is raised.
    fn run(&self, signal: &Signal) -> Result<(), TaskError>;

    /// Releases what `init` or `run` acquired. Always called last.
    fn uninit(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called synchronously from the thread calling `stop`.
    ///
    /// Use it to interrupt a blocking wait inside `run`. Must not block.
    fn stop_requested(&self) {}

    /// Receives every failure raised by `init`, `run` or `uninit`.
    ///
    /// Runs on the thread that executed the failing hook. The default logs
    /// the error and continues.
    fn on_error(&self, err: TaskError) {
        tracing::error!(task = self.name(), label = err.as_label(), error = %err, "task error");
    }
}
