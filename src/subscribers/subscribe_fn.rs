//! # Closure-backed listener (`SubscribeFn`)
//!
//! Adapts any `Fn(&Event)` callback to [`Subscribe`], for collaborators that only want
//! a plain callback of shape `(Event) -> ()`.
//!
//! ## Example
//! ```rust
//! use protovisor::{Event, SubscribeFn, Subscribe};
//!
//! let printer = SubscribeFn::new("printer", |ev: &Event| println!("{}: {}", ev.kind, ev.message));
//! assert_eq!(printer.name(), "printer");
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Listener that calls a closure for every event.
pub struct SubscribeFn<F> {
    name: &'static str,
    f: F,
}

impl<F> SubscribeFn<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    /// Wraps `f` under the given listener name.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

#[async_trait]
impl<F> Subscribe for SubscribeFn<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    async fn on_event(&self, event: &Event) {
        (self.f)(event);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
