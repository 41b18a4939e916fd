//! # Service variants.
//!
//! A service owns the lifecycle of at most one task run at a time:
//!
//! ```text
//!        start(task) ──CAS ok──►  Running  ──uninit done──►  Idle
//!   Idle ────────────────────────►   │                         ▲
//!        start(task) ──CAS fail──► AlreadyRunning (no effect)  │
//!                                    └── stop(): signal + stop_requested
//! ```
//!
//! | variant              | where `init → run → uninit` executes           |
//! |----------------------|------------------------------------------------|
//! | [`SyncService`]      | the thread calling `start` (which blocks)      |
//! | [`ThreadService`]    | a freshly spawned, named OS thread             |
//! | [`ExecutorService`]  | a job submitted to an [`Executor`]             |
//! | [`CoroutineService`] | a tokio task inside a cancellation scope       |
//!
//! All variants share the [`Service`] trait for stopping and waiting, so
//! heterogeneous services can be waited on together with [`wait_all`].

mod coroutine;
mod executor;
mod sync;
mod thread;

use std::time::Duration;

pub use coroutine::CoroutineService;
pub use executor::{Executor, ExecutorService, Job};
pub use sync::SyncService;
pub use thread::ThreadService;

/// Control surface common to every service variant.
///
/// `start` is not part of the trait because variants accept different task
/// kinds ([`Task`](crate::Task) or [`CoTask`](crate::CoTask)).
pub trait Service: Send + Sync {
    /// Service name used in logs and events.
    fn name(&self) -> &str;

    /// Requests a cooperative stop of the active run.
    ///
    /// Raises the signal, then calls the task's `stop_requested` hook on the
    /// current thread. No-op when idle. Never waits for the run to end.
    fn stop(&self);

    /// `true` from a successful `start` until `uninit` has completed.
    fn is_running(&self) -> bool;

    /// Blocks until the active run completes or `timeout` elapses.
    ///
    /// `Duration::ZERO` waits without a bound. Returns `true` if the service
    /// was idle or the run completed, `false` if the timeout elapsed first.
    fn wait(&self, timeout: Duration) -> bool;

    /// [`stop`](Service::stop) followed by an unbounded [`wait`](Service::wait).
    fn stop_and_wait(&self) {
        self.stop();
        self.wait(Duration::ZERO);
    }
}

/// Waits, without a bound, for every service in `services`, one after another.
///
/// Returns once all of them are idle, whatever order they finish in.
///
/// ```rust
/// use taskservice::{Service, TaskFn, ThreadService, wait_all};
///
/// let a = ThreadService::new();
/// let b = ThreadService::new();
/// a.start(TaskFn::arc("a", |_| Ok(()))).unwrap();
/// b.start(TaskFn::arc("b", |_| Ok(()))).unwrap();
///
/// wait_all(&[&a, &b]);
/// assert!(!a.is_running() && !b.is_running());
/// ```
pub fn wait_all(services: &[&dyn Service]) {
    for svc in services {
        svc.wait(Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::TaskFn;

    fn sleeper(ms: u64) -> Arc<TaskFn> {
        TaskFn::arc("sleeper", move |_| {
            thread::sleep(Duration::from_millis(ms));
            Ok(())
        })
    }

    #[test]
    fn wait_all_returns_when_every_service_is_idle() {
        let fast = ThreadService::new().with_name("fast");
        let slow = ThreadService::new().with_name("slow");
        let sync = Arc::new(SyncService::new());

        slow.start(sleeper(300)).unwrap();
        fast.start(sleeper(50)).unwrap();
        let blocking = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                sync.start(sleeper(150)).unwrap();
            })
        };
        thread::sleep(Duration::from_millis(50));

        // fast first, slow last: order of the slice does not matter
        wait_all(&[&fast, &*sync, &slow]);
        assert!(!fast.is_running());
        assert!(!sync.is_running());
        assert!(!slow.is_running());
        blocking.join().unwrap();
    }

    #[test]
    fn wait_all_on_idle_services_returns_at_once() {
        let a = ThreadService::new();
        let b = SyncService::new();
        wait_all(&[&a, &b]);
        wait_all(&[]);
    }
}
