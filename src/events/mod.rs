//! Events: types and the listener bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! broadcast events emitted by the registration workflow and cluster runs.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Payload`] event classification and payload
//! - [`EventBus`] runtime listener registry with per-listener queues
//!
//! ## Quick reference
//! - **Publishers**: [`Registrar`](crate::Registrar), [`ClusterManager`](crate::ClusterManager)
//!   (when a bus is attached), the binary.
//! - **Consumers**: any [`Subscribe`](crate::Subscribe) implementation, e.g.
//!   [`LogWriter`](crate::LogWriter) or a [`SubscribeFn`](crate::SubscribeFn) closure.

mod bus;
mod event;

pub use bus::{EventBus, ListenerId};
pub use event::{Event, EventKind, Payload};
