//! # Event listeners.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations for
//! handling events broadcast through the [`EventBus`](crate::EventBus).
//!
//! ## Architecture
//! ```text
//! Registrar / ClusterManager ── emit(Event) ──► EventBus ──► per-listener queue
//!                                                               │
//!                                                               ├──► LogWriter (tracing)
//!                                                               ├──► SubscribeFn (closure)
//!                                                               └──► Custom ...
//! ```
//!
//! ## Implementing custom listeners
//! ```no_run
//! use protovisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ServiceRegistered {
//!             // write audit record...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

mod log;
mod subscribe;
mod subscribe_fn;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscribe_fn::SubscribeFn;
