//! Runtime core: run state and lifecycle driving.
//!
//! Nothing here is public; the service variants in [`crate::services`] are
//! thin shells over these pieces.
//!
//! Internal modules:
//! - [`slot`]: the compare-and-swap run cell, stop signal and completion latch;
//! - [`runner`]: executes `init → run → uninit` with panic containment and events;
//! - [`service`]: name, slot and bus shared by all variants.

mod runner;
mod service;
mod slot;

pub(crate) use runner::{CoRun, run_lifecycle};
pub(crate) use service::ServiceCore;
