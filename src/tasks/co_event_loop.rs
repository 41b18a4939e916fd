//! # Async event-loop task.
//!
//! [`EventLoopCoTask`] is the cooperative counterpart of
//! [`EventLoopTask`](crate::EventLoopTask): same state machine, built on
//! `tokio::sync::mpsc::unbounded_channel` and `tokio::time::timeout_at`, with
//! async handlers. Run it with [`CoroutineService`](crate::CoroutineService).
//!
//! ## Rules
//! - Signal is checked right after each wait returns.
//! - `stop_requested` sends a wake-up sentinel (synchronously; unbounded sends
//!   never wait).
//! - The idle deadline is re-armed after each dispatch only; a sentinel with no
//!   raised signal does not move it.
//! - `uninit` replaces the channel; the old one is closed and its events dropped.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::TaskError;
use crate::signal::Signal;
use crate::tasks::co_task::CoTask;

type EventHandler<E> = Box<dyn Fn(E) -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;
type IdleHandler = Box<dyn Fn() -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;
type ErrorHandler = Box<dyn Fn(TaskError) -> BoxFuture<'static, ()> + Send + Sync>;

enum Envelope<E> {
    Event(E),
    Wake,
}

struct Queue<E> {
    tx: mpsc::UnboundedSender<Envelope<E>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Envelope<E>>>>,
}

impl<E> Queue<E> {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// Reusable async event loop.
pub struct EventLoopCoTask<E> {
    name: Cow<'static, str>,
    queue: RwLock<Queue<E>>,
    idle_timeout: Option<Duration>,
    on_event: EventHandler<E>,
    on_idle: Option<IdleHandler>,
    on_error: Option<ErrorHandler>,
}

impl<E: Send + 'static> EventLoopCoTask<E> {
    /// Creates an event loop that waits for events forever.
    pub fn new<F, Fut>(on_event: F) -> Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self {
            name: Cow::Borrowed("event-loop"),
            queue: RwLock::new(Queue::new()),
            idle_timeout: None,
            on_event: Box::new(move |e| Box::pin(on_event(e))),
            on_idle: None,
            on_error: None,
        }
    }

    /// Creates an event loop whose idle timeout comes from [`Config::idle_timeout`].
    pub fn with_defaults<F, Fut>(on_event: F, cfg: &Config) -> Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let mut task = Self::new(on_event);
        task.idle_timeout = cfg.idle_timeout();
        task
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// `Duration::ZERO` means wait forever.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = (timeout > Duration::ZERO).then_some(timeout);
        self
    }

    pub fn with_idle_handler<F, Fut>(mut self, on_idle: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.on_idle = Some(Box::new(move || Box::pin(on_idle())));
        self
    }

    pub fn with_error_handler<F, Fut>(mut self, on_error: F) -> Self
    where
        F: Fn(TaskError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(Box::new(move |e| Box::pin(on_error(e))));
        self
    }

    /// Appends an event to the queue. Never waits.
    pub fn send_event(&self, event: E) {
        let _ = self.queue.read().tx.send(Envelope::Event(event));
    }

    fn idle_deadline(&self) -> Option<Instant> {
        self.idle_timeout.map(|timeout| Instant::now() + timeout)
    }
}

#[async_trait]
impl<E: Send + 'static> CoTask for EventLoopCoTask<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, signal: &Signal) -> Result<(), TaskError> {
        let rx = Arc::clone(&self.queue.read().rx);
        let mut rx = rx.lock().await;
        let mut deadline = self.idle_deadline();
        loop {
            let received = match deadline {
                Some(at) => tokio::time::timeout_at(at, rx.recv()).await.ok(),
                None => Some(rx.recv().await),
            };
            if signal.is_signalled() {
                break;
            }
            match received {
                Some(Some(Envelope::Event(event))) => (self.on_event)(event).await?,
                Some(Some(Envelope::Wake)) => continue,
                Some(None) => break,
                None => {
                    if let Some(on_idle) = &self.on_idle {
                        on_idle().await?;
                    }
                }
            }
            deadline = self.idle_deadline();
        }
        Ok(())
    }

    async fn uninit(&self) -> Result<(), TaskError> {
        let stale = std::mem::replace(&mut *self.queue.write(), Queue::new());
        if let Ok(mut rx) = stale.rx.try_lock() {
            rx.close();
        }
        Ok(())
    }

    fn stop_requested(&self) {
        let _ = self.queue.read().tx.send(Envelope::Wake);
    }

    async fn on_error(&self, err: TaskError) {
        match &self.on_error {
            Some(f) => f(err).await,
            None => tracing::error!(task = %self.name, error = %err, "event loop error"),
        }
    }
}
