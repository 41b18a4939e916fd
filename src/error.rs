//! Error types used by services and tasks.
//!
//! This module defines two main error enums:
//!
//! - [`ServiceError`] — errors a service returns synchronously from `start`.
//! - [`TaskError`] — errors raised by task hooks and delivered to
//!   [`Task::on_error`](crate::Task::on_error).
//!
//! Both types provide [`as_label`](TaskError::as_label) for logging.

use std::any::Any;
use std::io;

use thiserror::Error;

/// # Errors produced by a service itself.
///
/// These are the only errors that ever leave `start`. Task failures are never
/// surfaced here; they go to the task's own error hook.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// `start` was called while a previous run is still in flight.
    #[error("service `{service}` has already been started")]
    AlreadyRunning {
        /// Name of the service.
        service: String,
    },

    /// The dedicated worker thread could not be created.
    #[error("service `{service}` failed to spawn its thread: {source}")]
    Spawn {
        /// Name of the service.
        service: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The executor refused to accept the run.
    #[error("service `{service}` was rejected by its executor: {reason}")]
    Rejected {
        /// Name of the service.
        service: String,
        /// Reason reported by the executor.
        reason: String,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskservice::ServiceError;
    ///
    /// let err = ServiceError::AlreadyRunning { service: "demo".into() };
    /// assert_eq!(err.as_label(), "service_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::AlreadyRunning { .. } => "service_already_running",
            ServiceError::Spawn { .. } => "service_spawn_failed",
            ServiceError::Rejected { .. } => "service_rejected",
        }
    }
}

/// # Errors produced by task hooks.
///
/// `Canceled` is the graceful-exit marker: a hook that returns it ends the run
/// like `Ok(())` and the error hook is not called.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A hook failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A hook panicked; the panic was contained by the service.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The run was cancelled cooperatively.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// ```
    /// use taskservice::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns `true` for [`TaskError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }

    /// Converts a panic payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let info = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        TaskError::Panicked { info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let err = TaskError::from_panic(Box::new("boom"));
        assert_eq!(err, TaskError::Panicked { info: "boom".into() });

        let err = TaskError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err, TaskError::Panicked { info: "owned".into() });

        let err = TaskError::from_panic(Box::new(42u8));
        assert_eq!(err.as_label(), "task_panicked");
    }

    #[test]
    fn service_error_display_names_the_service() {
        let err = ServiceError::Rejected {
            service: "pool".into(),
            reason: "shut down".into(),
        };
        assert_eq!(
            err.to_string(),
            "service `pool` was rejected by its executor: shut down"
        );
        assert_eq!(err.as_label(), "service_rejected");
    }

    #[test]
    fn canceled_is_graceful() {
        assert!(TaskError::Canceled.is_canceled());
        assert!(!TaskError::fail("x").is_canceled());
    }
}
