//! # Recycling pool.
//!
//! [`RecyclePool`] keeps up to `capacity` released instances so hot paths
//! (typically event objects fed to an event loop) can reuse them instead of
//! allocating. It is a lock-free bounded queue plus a factory.
//!
//! ## Rules
//! - `acquire` never waits: a cached instance if one is available, else `factory()`.
//! - `release` never waits: the instance is cached if there is room, else dropped.
//! - Reused instances keep whatever state they had; reset them before use.
//! - No ordering or fairness between callers.

use crossbeam::queue::ArrayQueue;

use crate::config::Config;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Bounded cache of reusable instances.
///
/// ```rust
/// use taskservice::RecyclePool;
///
/// let pool = RecyclePool::new(Vec::<u8>::new, 4);
/// let mut buf = pool.acquire();
/// buf.extend_from_slice(b"frame");
/// buf.clear();
/// pool.release(buf);
/// assert_eq!(pool.len(), 1);
/// ```
pub struct RecyclePool<T> {
    slots: ArrayQueue<T>,
    factory: Factory<T>,
}

impl<T> RecyclePool<T> {
    /// Creates a pool retaining at most `capacity` instances (minimum 1).
    pub fn new<F>(factory: F, capacity: usize) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            slots: ArrayQueue::new(capacity.max(1)),
            factory: Box::new(factory),
        }
    }

    /// Creates a pool sized by [`Config::pool_capacity`].
    pub fn with_defaults<F>(factory: F, cfg: &Config) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(factory, cfg.pool_capacity_clamped())
    }

    /// Takes a cached instance, or builds a new one.
    pub fn acquire(&self) -> T {
        self.slots.pop().unwrap_or_else(|| (self.factory)())
    }

    /// Returns `value` to the pool; drops it when the pool is full.
    pub fn release(&self, value: T) {
        let _ = self.slots.push(value);
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of cached instances.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[derive(Default)]
    struct Frame {
        value: u32,
    }

    #[test]
    fn released_instance_is_handed_out_again() {
        let pool = RecyclePool::new(Frame::default, 10);
        let mut frame = pool.acquire();
        assert_eq!(frame.value, 0);

        frame.value = 100;
        pool.release(frame);

        assert_eq!(pool.acquire().value, 100);
        assert_eq!(pool.acquire().value, 0);
    }

    #[test]
    fn release_beyond_capacity_drops() {
        let built = Arc::new(AtomicUsize::new(0));
        let pool = {
            let built = Arc::clone(&built);
            RecyclePool::new(
                move || {
                    built.fetch_add(1, Ordering::SeqCst);
                    Frame::default()
                },
                2,
            )
        };
        let frames: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        assert_eq!(built.load(Ordering::SeqCst), 3);

        frames.into_iter().for_each(|f| pool.release(f));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn capacity_comes_from_config_and_is_clamped() {
        let pool = RecyclePool::with_defaults(Frame::default, &Config::default());
        assert_eq!(pool.capacity(), 10);

        let pool = RecyclePool::new(Frame::default, 0);
        assert_eq!(pool.capacity(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn shared_between_threads() {
        let pool = Arc::new(RecyclePool::new(Frame::default, 8));
        let workers: Vec<_> = (0..4)
            .map(|n| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let mut f = pool.acquire();
                        f.value = n;
                        pool.release(f);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(pool.len() <= 8);
        assert!(!pool.is_empty());
    }
}
