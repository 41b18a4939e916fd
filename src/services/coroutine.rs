//! # Cooperative-task service.
//!
//! Runs a [`CoTask`] as a tokio task spawned on a caller-supplied runtime
//! [`Handle`], inside a cancellation scope.
//!
//! ## Cancellation
//! ```text
//! scope.cancel() ──► pending init/run future dropped ──► RunCanceled
//!                                                       └─► uninit ──► idle
//! ```
//! Scope cancellation is not an error: `on_error` is not called for it.
//! `stop()` is the usual way to end a run; the scope exists so a parent
//! component can tear down many services at once.
//!
//! ## Runtime shutdown
//! The runtime belongs to the caller. If it shuts down while a run is in
//! flight, the run's future is dropped mid-await: the service returns to idle
//! and publishes `RunCanceled` and `ServiceStopped`, but `uninit` does not run.
//! This is the only case where `uninit` is skipped. A runtime that is already
//! shut down at `start` drops the run before any hook executes.
//!
//! ## Waiting
//! [`Service::wait`] blocks the calling thread. Call it from a thread that may
//! block, never from inside a task running on a runtime worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::core::{CoRun, ServiceCore};
use crate::error::ServiceError;
use crate::events::Bus;
use crate::services::Service;
use crate::tasks::{CoTask, CoTaskRef};

/// Runs a [`CoTask`] on a tokio runtime.
///
/// ```rust
/// use std::time::Duration;
/// use taskservice::{CoTaskFn, CoroutineService, Service};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let svc = CoroutineService::new(rt.handle().clone());
///
/// let task = CoTaskFn::arc("poll", |signal| {
///     Box::pin(async move {
///         while !signal.is_signalled() {
///             tokio::time::sleep(Duration::from_millis(10)).await;
///         }
///         Ok(())
///     })
/// });
/// svc.start(task).unwrap();
/// svc.stop_and_wait();
/// assert!(!svc.is_running());
/// ```
pub struct CoroutineService {
    core: ServiceCore<dyn CoTask>,
    handle: Handle,
    scope: CancellationToken,
}

impl CoroutineService {
    /// Spawns runs on `handle` with a private, never-cancelled scope.
    pub fn new(handle: Handle) -> Self {
        Self {
            core: ServiceCore::new("coroutine-service"),
            handle,
            scope: CancellationToken::new(),
        }
    }

    /// Runs every future start inside `scope`.
    ///
    /// Pass a child of a parent token (`parent.child_token()`) to have the
    /// parent's cancellation end the run.
    pub fn with_scope(mut self, scope: CancellationToken) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the service name used in logs and events.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.core.set_name(name);
        self
    }

    /// Publishes lifecycle events on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.core.set_bus(bus);
        self
    }

    /// The scope runs are bound to.
    pub fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    /// Spawns `task`'s lifecycle on the runtime and returns immediately.
    ///
    /// # Errors
    /// [`ServiceError::AlreadyRunning`] if another run is in flight.
    pub fn start(&self, task: CoTaskRef) -> Result<&Self, ServiceError> {
        let run = CoRun::new(self.core.begin(task)?, self.core.context());
        drop(self.handle.spawn(run.drive(self.scope.clone())));
        Ok(self)
    }
}

impl Service for CoroutineService {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn stop(&self) {
        if let Some(run) = self.core.request_stop(|t| t.name()) {
            run.task().stop_requested();
        }
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn wait(&self, timeout: Duration) -> bool {
        self.core.wait(timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::runtime::Runtime;

    use super::*;
    use crate::CoTaskFn;
    use crate::error::TaskError;
    use crate::events::EventKind;
    use crate::signal::Signal;

    #[derive(Default)]
    struct Ticker {
        ticks: AtomicUsize,
        inits: AtomicUsize,
        uninits: AtomicUsize,
        errors: Mutex<Vec<TaskError>>,
    }

    #[async_trait]
    impl CoTask for Ticker {
        fn name(&self) -> &str {
            "ticker"
        }

        async fn init(&self) -> Result<(), TaskError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn run(&self, signal: &Signal) -> Result<(), TaskError> {
            while !signal.is_signalled() {
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.ticks.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        async fn uninit(&self) -> Result<(), TaskError> {
            self.uninits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_error(&self, err: TaskError) {
            self.errors.lock().push(err);
        }
    }

    #[test]
    fn stop_and_restart() {
        let rt = Runtime::new().unwrap();
        let task = Arc::new(Ticker::default());
        let svc = CoroutineService::new(rt.handle().clone());

        svc.start(Arc::clone(&task) as CoTaskRef).unwrap();
        assert!(svc.start(Arc::clone(&task) as CoTaskRef).is_err());
        thread::sleep(Duration::from_millis(50));
        svc.stop_and_wait();
        assert!(!svc.is_running());

        svc.start(Arc::clone(&task) as CoTaskRef).unwrap();
        assert!(!svc.wait(Duration::from_millis(50)));
        svc.stop_and_wait();

        assert_eq!(task.inits.load(Ordering::SeqCst), 2);
        assert_eq!(task.uninits.load(Ordering::SeqCst), 2);
        assert!(task.ticks.load(Ordering::SeqCst) > 0);
        assert!(task.errors.lock().is_empty());
    }

    #[test]
    fn scope_cancellation_is_graceful() {
        let rt = Runtime::new().unwrap();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let parent = CancellationToken::new();
        let task = Arc::new(Ticker::default());
        let svc = CoroutineService::new(rt.handle().clone())
            .with_scope(parent.child_token())
            .with_bus(bus);

        svc.start(Arc::clone(&task) as CoTaskRef).unwrap();
        thread::sleep(Duration::from_millis(30));
        parent.cancel();

        assert!(svc.wait(Duration::from_secs(5)));
        assert!(!svc.is_running());
        assert_eq!(task.uninits.load(Ordering::SeqCst), 1);
        assert!(task.errors.lock().is_empty());

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ServiceStarting,
                EventKind::RunCanceled,
                EventKind::ServiceStopped
            ]
        );
    }

    #[test]
    fn run_failure_reaches_on_error_after_uninit() {
        let rt = Runtime::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let task = {
            let (uninit_log, error_log) = (Arc::clone(&log), Arc::clone(&log));
            CoTaskFn::new("failing", |_| {
                Box::pin(async { Err(TaskError::fail("lost connection")) })
            })
            .with_uninit(move || {
                let log = Arc::clone(&uninit_log);
                async move {
                    log.lock().push("uninit".into());
                    Ok(())
                }
            })
            .with_on_error(move |e| {
                let log = Arc::clone(&error_log);
                async move { log.lock().push(e.to_string()) }
            })
            .into_arc()
        };
        let svc = CoroutineService::new(rt.handle().clone());
        svc.start(task).unwrap();

        assert!(svc.wait(Duration::from_secs(5)));
        assert_eq!(
            log.lock().clone(),
            vec!["uninit", "execution failed: lost connection"]
        );
    }

    #[test]
    fn runtime_shutdown_mid_run_releases_the_service_and_reports_it() {
        let rt = Runtime::new().unwrap();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let task = Arc::new(Ticker::default());
        let svc = CoroutineService::new(rt.handle().clone())
            .with_name("doomed")
            .with_bus(bus);

        svc.start(Arc::clone(&task) as CoTaskRef).unwrap();
        thread::sleep(Duration::from_millis(50));
        drop(rt);

        assert!(svc.wait(Duration::from_secs(2)));
        assert!(!svc.is_running());
        assert_eq!(task.inits.load(Ordering::SeqCst), 1);
        assert_eq!(task.uninits.load(Ordering::SeqCst), 0);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![
                EventKind::ServiceStarting,
                EventKind::RunCanceled,
                EventKind::ServiceStopped
            ]
        );
        assert!(events.iter().all(|e| e.task.as_deref() == Some("ticker")));
    }

    fn explode() -> Result<(), TaskError> {
        panic!("no init for you")
    }

    #[test]
    fn panic_in_init_skips_run() {
        let rt = Runtime::new().unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let task = {
            let (ran, errors) = (Arc::clone(&ran), Arc::clone(&errors));
            CoTaskFn::new("bad-init", move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            })
            .with_init(|| async { explode() })
            .with_on_error(move |e| {
                let errors = Arc::clone(&errors);
                async move { errors.lock().push(e.as_label()) }
            })
            .into_arc()
        };
        let svc = CoroutineService::new(rt.handle().clone());
        svc.start(task).unwrap();

        assert!(svc.wait(Duration::from_secs(5)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(errors.lock().clone(), vec!["task_panicked"]);
    }
}
