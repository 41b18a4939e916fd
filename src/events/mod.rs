//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! observe service lifecycle transitions.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Stage`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the lifecycle runner (start, failures, stop) and every
//!   service's `stop()`.
//! - **Consumers**: whatever the application subscribes via [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, Stage};
