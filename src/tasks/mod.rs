//! # Task abstractions.
//!
//! This module provides the task-side types:
//! - [`Task`] / [`TaskRef`] - blocking task contract and its shared handle
//! - [`CoTask`] / [`CoTaskRef`] - async task contract and its shared handle
//! - [`TaskFn`] / [`CoTaskFn`] - tasks assembled from closures
//! - [`EventLoopTask`] / [`EventLoopCoTask`] - reusable queue-driven loops

mod co_event_loop;
mod co_task;
mod event_loop;
mod task;
mod task_fn;

pub use co_event_loop::EventLoopCoTask;
pub use co_task::{CoTask, CoTaskRef};
pub use event_loop::EventLoopTask;
pub use task::{Task, TaskRef};
pub use task_fn::{CoTaskFn, TaskFn};
