//! # Crate-wide defaults.
//!
//! Provides [`Config`], the central place for defaults used when building
//! services, event-loop tasks, pools and buses.
//!
//! Config is used through `with_defaults` / `from_config` constructors:
//! - [`EventLoopTask::with_defaults`](crate::EventLoopTask::with_defaults)
//! - [`EventLoopCoTask::with_defaults`](crate::EventLoopCoTask::with_defaults)
//! - [`RecyclePool::with_defaults`](crate::RecyclePool::with_defaults)
//! - [`Bus::from_config`](crate::Bus::from_config)
//! - [`ThreadService::from_config`](crate::ThreadService::from_config)
//!
//! ## Sentinel values
//! - `idle_timeout = 0s` → no idle timeout (wait for events forever)
//! - `pool_capacity = 0` / `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Default settings.
///
/// ## Field semantics
/// - `idle_timeout`: How long an event loop waits for an event before calling
///   its idle handler (`0s` = never idle)
/// - `pool_capacity`: Maximum number of instances a recycling pool retains
/// - `bus_capacity`: Lifecycle event ring buffer size
/// - `thread_name`: Name given to threads spawned by a thread service
///
/// ## Notes
/// All fields are public. Prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Idle timeout for event-loop tasks.
    pub idle_timeout: Duration,

    /// Retained instances per recycling pool.
    pub pool_capacity: usize,

    /// Capacity of the lifecycle event bus.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Name of threads spawned by [`ThreadService`](crate::ThreadService).
    pub thread_name: String,
}

impl Config {
    /// Returns the idle timeout as an `Option`.
    ///
    /// - `None` → wait for events forever
    /// - `Some(d)` → idle handler fires after `d` without events
    #[inline]
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout == Duration::ZERO {
            None
        } else {
            Some(self.idle_timeout)
        }
    }

    /// Returns the pool capacity clamped to a minimum of 1.
    #[inline]
    pub fn pool_capacity_clamped(&self) -> usize {
        self.pool_capacity.max(1)
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `idle_timeout = 0s` (never idle)
    /// - `pool_capacity = 10`
    /// - `bus_capacity = 1024`
    /// - `thread_name = "task-service"`
    fn default() -> Self {
        Self {
            idle_timeout: Duration::ZERO,
            pool_capacity: 10,
            bus_capacity: 1024,
            thread_name: "task-service".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_accessors() {
        let mut cfg = Config::default();
        assert_eq!(cfg.idle_timeout(), None);
        assert_eq!(cfg.pool_capacity_clamped(), 10);

        cfg.idle_timeout = Duration::from_millis(250);
        cfg.pool_capacity = 0;
        cfg.bus_capacity = 0;
        assert_eq!(cfg.idle_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.pool_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
