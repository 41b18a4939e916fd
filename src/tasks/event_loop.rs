//! # Event-loop task.
//!
//! [`EventLoopTask`] owns an unbounded queue and dispatches each queued event
//! to an event handler. When no event arrives within the idle timeout it calls
//! the idle handler instead.
//!
//! ## State machine
//! ```text
//!            ┌──────── event ────────► Dispatching ───────┐
//!            │                                            ▼
//! WaitingForEvent ◄───────────────────────────────────────┤
//!            │                                            ▲
//!            ├──────── timeout ──────► Idle-Dispatching ──┘
//!            │
//!            └──── wait returns & signal raised ──► Terminated
//! ```
//!
//! ## Rules
//! - The signal is checked right after every wait returns, so an event that is
//!   dequeued after `stop` is never dispatched.
//! - `stop_requested` pushes a wake-up sentinel so a blocked wait returns at
//!   once instead of running into its timeout.
//! - The idle timeout counts from the last dispatch. A sentinel that arrives
//!   without a raised signal is skipped and leaves the idle deadline as it was.
//! - `uninit` swaps in a fresh queue; anything still queued is dropped and the
//!   task can be started again.
//! - A handler failure ends the run; the error reaches the error handler after
//!   `uninit`.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::TaskError;
use crate::signal::Signal;
use crate::tasks::task::Task;

type EventHandler<E> = Box<dyn Fn(E) -> Result<(), TaskError> + Send + Sync>;
type IdleHandler = Box<dyn Fn() -> Result<(), TaskError> + Send + Sync>;
type ErrorHandler = Box<dyn Fn(TaskError) + Send + Sync>;

/// Queue entry: a user event or the stop sentinel.
enum Envelope<E> {
    Event(E),
    Wake,
}

struct Queue<E> {
    tx: Sender<Envelope<E>>,
    rx: Receiver<Envelope<E>>,
}

impl<E> Queue<E> {
    fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }
}

/// Reusable blocking event loop.
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use std::sync::Arc;
/// use taskservice::{EventLoopTask, Service, ThreadService};
///
/// let task = Arc::new(
///     EventLoopTask::new(|line: String| {
///         println!("{line}");
///         Ok(())
///     })
///     .with_idle_timeout(Duration::from_millis(200)),
/// );
///
/// let svc = ThreadService::new();
/// svc.start(task.clone()).unwrap();
/// task.send_event("hello".to_string());
/// svc.stop_and_wait();
/// ```
pub struct EventLoopTask<E> {
    name: Cow<'static, str>,
    queue: RwLock<Queue<E>>,
    idle_timeout: Option<Duration>,
    on_event: EventHandler<E>,
    on_idle: Option<IdleHandler>,
    on_error: Option<ErrorHandler>,
}

impl<E: Send + 'static> EventLoopTask<E> {
    /// Creates an event loop that waits for events forever.
    pub fn new<F>(on_event: F) -> Self
    where
        F: Fn(E) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed("event-loop"),
            queue: RwLock::new(Queue::new()),
            idle_timeout: None,
            on_event: Box::new(on_event),
            on_idle: None,
            on_error: None,
        }
    }

    /// Creates an event loop whose idle timeout comes from [`Config::idle_timeout`].
    pub fn with_defaults<F>(on_event: F, cfg: &Config) -> Self
    where
        F: Fn(E) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        let mut task = Self::new(on_event);
        task.idle_timeout = cfg.idle_timeout();
        task
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets how long a wait lasts before the idle handler fires.
    ///
    /// `Duration::ZERO` means wait forever.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = (timeout > Duration::ZERO).then_some(timeout);
        self
    }

    pub fn with_idle_handler<F>(mut self, on_idle: F) -> Self
    where
        F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    pub fn with_error_handler<F>(mut self, on_error: F) -> Self
    where
        F: Fn(TaskError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Appends an event to the queue. Never blocks.
    ///
    /// Events are delivered in send order. Events sent while the task is not
    /// running wait for the next run.
    pub fn send_event(&self, event: E) {
        let _ = self.queue.read().tx.send(Envelope::Event(event));
    }

    /// Number of events waiting in the current queue.
    pub fn pending(&self) -> usize {
        self.queue.read().rx.len()
    }

    fn idle_deadline(&self) -> Option<Instant> {
        self.idle_timeout.map(|timeout| Instant::now() + timeout)
    }
}

/// `Ok(None)` once `deadline` passes with nothing queued.
fn receive<E>(
    rx: &Receiver<Envelope<E>>,
    deadline: Option<Instant>,
) -> Result<Option<Envelope<E>>, RecvTimeoutError> {
    let received = match deadline {
        Some(deadline) => rx.recv_deadline(deadline),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(env) => Ok(Some(env)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(e) => Err(e),
    }
}

impl<E: Send + 'static> Task for EventLoopTask<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, signal: &Signal) -> Result<(), TaskError> {
        let rx = self.queue.read().rx.clone();
        let mut deadline = self.idle_deadline();
        loop {
            let received = receive(&rx, deadline);
            if signal.is_signalled() {
                break;
            }
            match received {
                Ok(Some(Envelope::Event(event))) => (self.on_event)(event)?,
                // Sentinel from a stop that loaded an earlier run.
                Ok(Some(Envelope::Wake)) => continue,
                Ok(None) => {
                    if let Some(on_idle) = &self.on_idle {
                        on_idle()?;
                    }
                }
                Err(_) => break,
            }
            deadline = self.idle_deadline();
        }
        Ok(())
    }

    fn uninit(&self) -> Result<(), TaskError> {
        let stale = std::mem::replace(&mut *self.queue.write(), Queue::new());
        let dropped = stale.rx.len();
        if dropped > 0 {
            tracing::debug!(task = %self.name, dropped, "discarding queued events");
        }
        Ok(())
    }

    fn stop_requested(&self) {
        let _ = self.queue.read().tx.send(Envelope::Wake);
    }

    fn on_error(&self, err: TaskError) {
        match &self.on_error {
            Some(f) => f(err),
            None => tracing::error!(task = %self.name, error = %err, "event loop error"),
        }
    }
}
