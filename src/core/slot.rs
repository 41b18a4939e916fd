//! # Run slot: the single-run state cell shared by every service.
//!
//! A [`RunSlot`] is `None` while the service is idle and holds the active
//! [`Run`] while a task is in flight. The only transition into the running
//! state is a compare-and-swap from `None`, so two concurrent `start` calls can
//! never both win.
//!
//! Every [`Run`] carries its own stop [`Signal`]. A `stop()` that loads a run
//! just as it finishes only marks that finished run; the next run always
//! starts with a cleared signal.
//!
//! ## Release order
//! ```text
//! uninit done ──► RunGuard::drop
//!                   ├─► run.signal.reset()
//!                   ├─► CAS run → None      (is_running() == false from here)
//!                   └─► run.finish()        (wakes every waiter)
//! ```
//!
//! The guard travels with the unit of work (into the spawned thread, the
//! executor job or the async task). Dropping it is the only way back to idle,
//! so a panic, a rejected job or a runtime shutdown that drops the work still
//! releases the slot.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex};

use crate::signal::Signal;

/// One accepted run: the task being executed, its stop signal and its
/// completion latch.
pub(crate) struct Run<T: ?Sized> {
    task: Arc<T>,
    signal: Signal,
    done: Mutex<bool>,
    finished: Condvar,
}

impl<T: ?Sized> Run<T> {
    fn new(task: Arc<T>) -> Self {
        Self {
            task,
            signal: Signal::new(),
            done: Mutex::new(false),
            finished: Condvar::new(),
        }
    }

    pub(crate) fn task(&self) -> &Arc<T> {
        &self.task
    }

    pub(crate) fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Blocks until the run finished or `timeout` elapsed (`None` = forever).
    ///
    /// Returns `true` if the run finished.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> bool {
        let mut done = self.done.lock();
        match timeout {
            None => {
                self.finished.wait_while(&mut done, |done| !*done);
                true
            }
            Some(timeout) => {
                let _ = self
                    .finished
                    .wait_while_for(&mut done, |done| !*done, timeout);
                *done
            }
        }
    }

    fn finish(&self) {
        *self.done.lock() = true;
        self.finished.notify_all();
    }
}

/// Atomic "no active run" / "active run" cell.
pub(crate) struct RunSlot<T: ?Sized> {
    current: ArcSwapOption<Run<T>>,
}

impl<T: ?Sized> RunSlot<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            current: ArcSwapOption::from(None),
        })
    }

    /// Claims the slot for `task`.
    ///
    /// Returns `None` when another run already holds it.
    pub(crate) fn begin(self: &Arc<Self>, task: Arc<T>) -> Option<RunGuard<T>> {
        let run = Arc::new(Run::new(task));
        let prev = self
            .current
            .compare_and_swap(&None::<Arc<Run<T>>>, Some(Arc::clone(&run)));
        if prev.is_some() {
            return None;
        }
        Some(RunGuard {
            slot: Arc::clone(self),
            run,
        })
    }

    /// Returns the active run, if any.
    pub(crate) fn current(&self) -> Option<Arc<Run<T>>> {
        self.current.load_full()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.current.load().is_some()
    }

    /// Waits for the active run, if any. `None` waits forever.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> bool {
        match self.current() {
            Some(run) => run.wait(timeout),
            None => true,
        }
    }
}

/// Ownership of an accepted run. Dropping it returns the slot to idle.
pub(crate) struct RunGuard<T: ?Sized> {
    slot: Arc<RunSlot<T>>,
    run: Arc<Run<T>>,
}

impl<T: ?Sized> RunGuard<T> {
    pub(crate) fn task(&self) -> &Arc<T> {
        self.run.task()
    }

    /// Stop signal of this run only.
    pub(crate) fn signal(&self) -> &Signal {
        self.run.signal()
    }
}

impl<T: ?Sized> Drop for RunGuard<T> {
    fn drop(&mut self) {
        self.run.signal.reset();
        let expected = Some(Arc::clone(&self.run));
        self.slot
            .current
            .compare_and_swap(&expected, None::<Arc<Run<T>>>);
        self.run.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;

    #[test]
    fn only_one_begin_wins() {
        let slot = RunSlot::<str>::new();
        let first = slot.begin(Arc::from("a")).expect("first claim");
        assert!(slot.begin(Arc::from("b")).is_none());
        assert!(slot.is_running());
        assert_eq!(&**first.task(), "a");

        drop(first);
        assert!(!slot.is_running());
        assert!(slot.begin(Arc::from("c")).is_some());
    }

    #[test]
    fn drop_wakes_waiters() {
        let slot = RunSlot::<str>::new();
        let guard = slot.begin(Arc::from("x")).unwrap();
        guard.signal().signal();

        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait(None))
        };
        thread::sleep(Duration::from_millis(50));
        drop(guard);

        assert!(waiter.join().unwrap());
        assert!(!slot.is_running());
    }

    #[test]
    fn late_stop_only_marks_the_finished_run() {
        let slot = RunSlot::<str>::new();
        let guard = slot.begin(Arc::from("first")).unwrap();
        let stale = slot.current().unwrap();
        drop(guard);

        // stop() loaded `stale` before the run ended and raises it afterwards
        stale.signal().signal();

        let next = slot.begin(Arc::from("second")).unwrap();
        assert!(!next.signal().is_signalled());
    }

    #[test]
    fn timed_wait_reports_timeout() {
        let slot = RunSlot::<str>::new();
        let _guard = slot.begin(Arc::from("x")).unwrap();
        assert!(!slot.wait(Some(Duration::from_millis(20))));
    }

    #[test]
    fn concurrent_begins_claim_once() {
        let slot = RunSlot::<str>::new();
        let before = Arc::new(Barrier::new(8));
        let after = Arc::new(Barrier::new(8));
        let winners = (0..8)
            .map(|_| {
                let (slot, before, after) =
                    (Arc::clone(&slot), Arc::clone(&before), Arc::clone(&after));
                thread::spawn(move || {
                    before.wait();
                    let guard = slot.begin(Arc::from("t"));
                    // hold the claim until every thread has tried
                    after.wait();
                    guard.is_some()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(!slot.is_running());
    }
}
