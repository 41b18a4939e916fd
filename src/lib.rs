//! # taskservice
//!
//! **Taskservice** gives long-running units of work a uniform
//! `start` / `stop` / `wait` lifecycle, whatever they run on.
//!
//! A task implements `init → run → uninit`. A service runs at most one task
//! at a time and decides *where* it runs: on the caller's thread, on a fresh
//! OS thread, on a caller-owned worker pool, or as a tokio task. Stopping is
//! cooperative: the service raises a [`Signal`] the task polls and calls the
//! task's `stop_requested` hook so blocking waits can be interrupted.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//!     │  Task impl   │   │   TaskFn /   │   │ EventLoopTask/ │
//!     │ (user type)  │   │  CoTaskFn    │   │ EventLoopCoTask│
//!     └──────┬───────┘   └──────┬───────┘   └───────┬────────┘
//!            ▼                  ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Service (one run at a time)                                      │
//! │  SyncService │ ThreadService │ ExecutorService │ CoroutineService │
//! │  - RunSlot   (CAS None → Some(run), completion latch)             │
//! │  - Signal    (cooperative stop flag)                              │
//! │  - Bus       (optional lifecycle events)                          │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼                                                    │
//!   init → run → uninit → on_error*                           │ publishes
//!   (panics contained, uninit always runs)                    ▼
//!                                          ┌────────────────────────────┐
//!                                          │ Bus (broadcast channel)    │
//!                                          │ ServiceStarting, Stop...,  │
//!                                          │ TaskFailed, RunCanceled,   │
//!                                          │ ServiceStopped             │
//!                                          └────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! start(task)
//!   ├─► CAS slot None → run     (fails ─► ServiceError::AlreadyRunning)
//!   ├─► publish ServiceStarting
//!   ├─► init ─Err─┐
//!   ├─► run  ─Err─┤   stop(): signal.signal() + task.stop_requested()
//!   ├─► uninit ◄──┘
//!   ├─► on_error(init/run error), on_error(uninit error)
//!   ├─► publish ServiceStopped
//!   └─► signal.reset(), slot → None, wake waiters
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Blocking and async task contracts, closure-built tasks.   | [`Task`], [`CoTask`], [`TaskFn`], [`CoTaskFn`] |
//! | **Event loops**   | Queue-driven tasks with idle timeout and wake-on-stop.    | [`EventLoopTask`], [`EventLoopCoTask`]      |
//! | **Services**      | Four execution strategies behind one control surface.     | [`Service`], [`ThreadService`], [`CoroutineService`] |
//! | **Utilities**     | Object recycling and composite waits.                     | [`RecyclePool`], [`wait_all`]               |
//! | **Events**        | Broadcast lifecycle events for logging or metrics.        | [`Bus`], [`Event`], [`EventKind`]           |
//! | **Errors**        | Typed errors for services and task hooks.                 | [`ServiceError`], [`TaskError`]             |
//! | **Configuration** | Shared defaults.                                          | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskservice::{EventLoopTask, Service, TaskFn, ThreadService};
//!
//! // A counter that ticks until stopped.
//! let ticker = TaskFn::arc("ticker", |signal| {
//!     while !signal.is_signalled() {
//!         std::thread::sleep(Duration::from_millis(10));
//!     }
//!     Ok(())
//! });
//! let svc = ThreadService::new().with_name("ticker");
//! svc.start(ticker).unwrap();
//!
//! // An event loop fed from this thread.
//! let printer = Arc::new(EventLoopTask::new(|line: String| {
//!     println!("{line}");
//!     Ok(())
//! }));
//! let printer_svc = ThreadService::new().with_name("printer");
//! printer_svc.start(printer.clone()).unwrap();
//! printer.send_event("hello".into());
//!
//! std::thread::sleep(Duration::from_millis(50));
//! svc.stop();
//! printer_svc.stop();
//! taskservice::wait_all(&[&svc, &printer_svc]);
//! assert!(!svc.is_running() && !printer_svc.is_running());
//! ```
mod config;
mod core;
mod error;
mod events;
mod pool;
mod services;
mod signal;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{ServiceError, TaskError};
pub use events::{Bus, Event, EventKind, Stage};
pub use pool::RecyclePool;
pub use services::{
    CoroutineService, Executor, ExecutorService, Job, Service, SyncService, ThreadService,
    wait_all,
};
pub use signal::Signal;
pub use tasks::{
    CoTask, CoTaskFn, CoTaskRef, EventLoopCoTask, EventLoopTask, Task, TaskFn, TaskRef,
};
