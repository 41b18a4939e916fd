//! # Closure-backed tasks (`TaskFn`, `CoTaskFn`)
//!
//! [`TaskFn`] and [`CoTaskFn`] assemble a task from closures: `run` is
//! mandatory, every other hook is optional and falls back to the trait
//! default when absent.
//!
//! ## Concurrency semantics
//! - Hooks are `Fn`, not `FnMut`: the same task may be started again after
//!   its service is idle, and may even be shared by several services.
//! - State shared between hooks must be captured explicitly (`Arc<...>`).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use taskservice::{Service, TaskFn, ThreadService};
//!
//! let ticks = Arc::new(AtomicU32::new(0));
//! let t = {
//!     let ticks = Arc::clone(&ticks);
//!     TaskFn::arc("once", move |_signal| {
//!         ticks.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//! };
//!
//! let svc = ThreadService::new();
//! svc.start(t).unwrap();
//! svc.wait(std::time::Duration::ZERO);
//! assert_eq!(ticks.load(Ordering::SeqCst), 1);
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::TaskError;
use crate::signal::Signal;
use crate::tasks::co_task::CoTask;
use crate::tasks::task::Task;

type Hook = Box<dyn Fn() -> Result<(), TaskError> + Send + Sync>;
type RunHook = Box<dyn Fn(&Signal) -> Result<(), TaskError> + Send + Sync>;
type StopHook = Box<dyn Fn() + Send + Sync>;
type ErrorHook = Box<dyn Fn(TaskError) + Send + Sync>;

/// Blocking task built from closures.
pub struct TaskFn {
    name: Cow<'static, str>,
    init: Option<Hook>,
    run: RunHook,
    uninit: Option<Hook>,
    stop_requested: Option<StopHook>,
    on_error: Option<ErrorHook>,
}

impl TaskFn {
    /// Creates a task whose `run` calls `f`.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Signal) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            init: None,
            run: Box::new(f),
            uninit: None,
            stop_requested: None,
            on_error: None,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<F>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(&Signal) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, f))
    }

    pub fn with_init<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.init = Some(Box::new(f));
        self
    }

    pub fn with_uninit<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.uninit = Some(Box::new(f));
        self
    }

    /// Sets the hook called from `stop`. It must not block.
    pub fn with_stop_requested<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.stop_requested = Some(Box::new(f));
        self
    }

    pub fn with_on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(TaskError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Wraps the finished builder into a shared handle.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Task for TaskFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> Result<(), TaskError> {
        self.init.as_ref().map_or(Ok(()), |f| f())
    }

    fn run(&self, signal: &Signal) -> Result<(), TaskError> {
        (self.run)(signal)
    }

    fn uninit(&self) -> Result<(), TaskError> {
        self.uninit.as_ref().map_or(Ok(()), |f| f())
    }

    fn stop_requested(&self) {
        if let Some(f) = &self.stop_requested {
            f();
        }
    }

    fn on_error(&self, err: TaskError) {
        match &self.on_error {
            Some(f) => f(err),
            None => tracing::error!(task = %self.name, error = %err, "task error"),
        }
    }
}

type CoHook = Box<dyn Fn() -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;
type CoRunHook =
    Box<dyn for<'a> Fn(&'a Signal) -> BoxFuture<'a, Result<(), TaskError>> + Send + Sync>;
type CoErrorHook = Box<dyn Fn(TaskError) -> BoxFuture<'static, ()> + Send + Sync>;

/// Async task built from closures.
///
/// `run` receives the signal by reference and returns a boxed future that may
/// borrow it, so bodies are written as `|signal| Box::pin(async move { ... })`.
///
/// ```rust
/// use std::time::Duration;
/// use taskservice::CoTaskFn;
///
/// let t = CoTaskFn::new("poller", |signal| {
///     Box::pin(async move {
///         while !signal.is_signalled() {
///             tokio::time::sleep(Duration::from_millis(50)).await;
///         }
///         Ok(())
///     })
/// })
/// .with_init(|| async { Ok(()) })
/// .into_arc();
/// # let _ = t;
/// ```
pub struct CoTaskFn {
    name: Cow<'static, str>,
    init: Option<CoHook>,
    run: CoRunHook,
    uninit: Option<CoHook>,
    stop_requested: Option<StopHook>,
    on_error: Option<CoErrorHook>,
}

impl CoTaskFn {
    /// Creates a task whose `run` calls `f`.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: for<'a> Fn(&'a Signal) -> BoxFuture<'a, Result<(), TaskError>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            init: None,
            run: Box::new(f),
            uninit: None,
            stop_requested: None,
            on_error: None,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<F>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: for<'a> Fn(&'a Signal) -> BoxFuture<'a, Result<(), TaskError>> + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, f))
    }

    pub fn with_init<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.init = Some(Box::new(move || Box::pin(f())));
        self
    }

    pub fn with_uninit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.uninit = Some(Box::new(move || Box::pin(f())));
        self
    }

    /// Sets the hook called from `stop`. It must not block.
    pub fn with_stop_requested<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.stop_requested = Some(Box::new(f));
        self
    }

    pub fn with_on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TaskError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(Box::new(move |err| Box::pin(f(err))));
        self
    }

    /// Wraps the finished builder into a shared handle.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl CoTask for CoTaskFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), TaskError> {
        match &self.init {
            Some(f) => f().await,
            None => Ok(()),
        }
    }

    async fn run(&self, signal: &Signal) -> Result<(), TaskError> {
        (self.run)(signal).await
    }

    async fn uninit(&self) -> Result<(), TaskError> {
        match &self.uninit {
            Some(f) => f().await,
            None => Ok(()),
        }
    }

    fn stop_requested(&self) {
        if let Some(f) = &self.stop_requested {
            f();
        }
    }

    async fn on_error(&self, err: TaskError) {
        match &self.on_error {
            Some(f) => f(err).await,
            None => tracing::error!(task = %self.name, error = %err, "task error"),
        }
    }
}
