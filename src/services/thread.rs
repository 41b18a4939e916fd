//! # Dedicated-thread service.
//!
//! Each `start` spawns a fresh named OS thread that runs the whole lifecycle
//! and exits. `wait` is a timed wait on that run's completion latch.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::core::{ServiceCore, run_lifecycle};
use crate::error::ServiceError;
use crate::events::Bus;
use crate::services::Service;
use crate::tasks::{Task, TaskRef};

/// Runs a [`Task`] on its own thread.
pub struct ThreadService {
    core: ServiceCore<dyn Task>,
    thread_name: String,
}

impl ThreadService {
    /// Idle service with the default [`Config`] thread name.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Names spawned threads after [`Config::thread_name`].
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            core: ServiceCore::new("thread-service"),
            thread_name: cfg.thread_name.clone(),
        }
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

    /// Spawns a thread running `task` and returns immediately.
    ///
    /// # Errors
    /// - [`ServiceError::AlreadyRunning`] if another run is in flight.
    /// - [`ServiceError::Spawn`] if the OS refused to create the thread; the
    ///   service is idle again and no hook has run.
    pub fn start(&self, task: TaskRef) -> Result<&Self, ServiceError> {
        let guard = self.core.begin(task)?;
        let ctx = self.core.context();

        thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                run_lifecycle(&**guard.task(), guard.signal(), &ctx);
                drop(guard);
            })
            .map_err(|source| {
                tracing::warn!(service = self.core.name(), error = %source, "thread spawn failed");
                ServiceError::Spawn {
                    service: self.core.name().to_string(),
                    source,
                }
            })?;
        Ok(self)
    }
}

impl Default for ThreadService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for ThreadService {
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
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::TaskFn;
    use crate::error::TaskError;
    use crate::events::{EventKind, Stage};

    /// Seeds a counter in `init`, then increments it once per completed second.
    fn counter(count: Arc<AtomicU32>) -> TaskRef {
        let seed = Arc::clone(&count);
        TaskFn::new("counter", move |signal| {
            loop {
                thread::sleep(Duration::from_secs(1));
                if signal.is_signalled() {
                    return Ok(());
                }
                count.fetch_add(1, Ordering::SeqCst);
            }
        })
        .with_init(move || {
            seed.store(0, Ordering::SeqCst);
            Ok(())
        })
        .into_arc()
    }

    #[test]
    fn counter_stopped_after_one_and_a_half_seconds() {
        let count = Arc::new(AtomicU32::new(42));
        let svc = ThreadService::new();
        svc.start(counter(Arc::clone(&count))).unwrap();

        thread::sleep(Duration::from_millis(1500));
        svc.stop_and_wait();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!svc.is_running());
    }

    #[test]
    fn start_returns_self_for_chaining() {
        let svc = ThreadService::new();
        assert!(
            svc.start(TaskFn::arc("quick", |_| Ok(())))
                .unwrap()
                .wait(Duration::from_secs(5))
        );
    }

    #[test]
    fn thread_is_named_from_config() {
        let seen = Arc::new(Mutex::new(None));
        let task = {
            let seen = Arc::clone(&seen);
            TaskFn::arc("who", move |_| {
                *seen.lock() = thread::current().name().map(str::to_string);
                Ok(())
            })
        };
        let cfg = Config {
            thread_name: "ticker-worker".into(),
            ..Config::default()
        };
        let svc = ThreadService::from_config(&cfg);
        svc.start(task).unwrap().wait(Duration::ZERO);
        assert_eq!(seen.lock().as_deref(), Some("ticker-worker"));
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let svc = ThreadService::new();
        svc.start(TaskFn::arc("spin", |signal| {
            while !signal.is_signalled() {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        }))
        .unwrap();

        assert!(!svc.wait(Duration::from_millis(50)));
        assert!(svc.is_running());
        svc.stop();
        assert!(svc.wait(Duration::from_secs(5)));
    }

    #[test]
    fn panic_in_run_is_routed_to_on_error_and_service_recovers() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let uninits = Arc::new(AtomicUsize::new(0));
        let task = {
            let (errors, uninits) = (Arc::clone(&errors), Arc::clone(&uninits));
            TaskFn::new("boom", |_| panic!("boom"))
                .with_uninit(move || {
                    uninits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_on_error(move |e| errors.lock().push(e))
                .into_arc()
        };
        let svc = ThreadService::new();
        svc.start(Arc::clone(&task) as TaskRef).unwrap().wait(Duration::ZERO);

        assert_eq!(uninits.load(Ordering::SeqCst), 1);
        assert_eq!(
            errors.lock().clone(),
            vec![TaskError::Panicked { info: "boom".into() }]
        );

        // restart with the same task works
        svc.start(task).unwrap().wait(Duration::ZERO);
        assert_eq!(uninits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn restart_after_stop_starts_with_a_cleared_signal() {
        let svc = ThreadService::new();
        let spin = || {
            TaskFn::arc("spin", |signal| {
                while !signal.is_signalled() {
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(())
            })
        };
        svc.start(spin()).unwrap();
        svc.stop_and_wait();
        assert!(!svc.is_running());

        svc.start(spin()).unwrap();
        assert!(!svc.wait(Duration::from_millis(50)));
        svc.stop_and_wait();
        assert!(!svc.is_running());
    }

    #[test]
    fn lifecycle_events_are_published_in_order() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let svc = ThreadService::new().with_name("ticker").with_bus(bus);

        svc.start(
            TaskFn::new("spin", |signal| {
                while !signal.is_signalled() {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(TaskError::fail("late"))
            })
            .into_arc(),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(30));
        svc.stop_and_wait();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ServiceStarting,
                EventKind::StopRequested,
                EventKind::TaskFailed,
                EventKind::ServiceStopped,
            ]
        );
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(events.iter().all(|e| e.service.as_deref() == Some("ticker")));
        assert_eq!(events[2].stage, Some(Stage::Run));
    }
}
