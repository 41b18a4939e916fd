//! # Async task contract.
//!
//! [`CoTask`] is the cooperative counterpart of [`Task`](crate::Task), run by
//! [`CoroutineService`](crate::CoroutineService) on a tokio runtime. Hooks that
//! may wait are `async`; [`stop_requested`](CoTask::stop_requested) stays
//! synchronous because it is invoked from whatever thread calls `stop`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::signal::Signal;

/// Shared handle to an async task.
pub type CoTaskRef = Arc<dyn CoTask>;

/// # Asynchronous, cooperatively stoppable unit of work.
///
/// Same lifecycle as [`Task`](crate::Task): `init`, `run`, then `uninit`
/// (always), with failures delivered to `on_error` afterwards. If the
/// enclosing cancellation scope is cancelled, the pending `init`/`run` future
/// is dropped and the run ends gracefully; `uninit` still runs.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use taskservice::{CoTask, Signal, TaskError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl CoTask for Ticker {
///     async fn run(&self, signal: &Signal) -> Result<(), TaskError> {
///         while !signal.is_signalled() {
///             tokio::time::sleep(Duration::from_millis(100)).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CoTask: Send + Sync + 'static {
    /// Human-readable name (for logs and events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Prepares the task. Called before `run`.
    async fn init(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Does the work until completion or until `signal` is raised.
    async fn run(&self, signal: &Signal) -> Result<(), TaskError>;

    /// Releases what `init` or `run` acquired. Always called last.
    async fn uninit(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called synchronously from the thread calling `stop`. Must not block.
    fn stop_requested(&self) {}

    /// Receives every failure raised by `init`, `run` or `uninit`.
    async fn on_error(&self, err: TaskError) {
        tracing::error!(task = self.name(), label = err.as_label(), error = %err, "task error");
    }
}
