//! # EventBus: runtime listener registry with non-blocking fan-out.
//!
//! [`EventBus`] lets any collaborator register a listener at runtime and broadcasts
//! each [`Event`] to every listener registered at the moment of emission.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │  lock ─► clone Arc<Vec<Listener>> ─► unlock        (snapshot)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► listener1.on_event()
//!     │   (unbounded)        └──────► panic → logged, worker keeps going
//!     ├──► [queue 2] ──► worker 2 ──► listener2.on_event()
//!     └──► [queue N] ──► worker N ──► listenerN.on_event()
//! ```
//!
//! ## Rules
//! - **Snapshot**: the list is copied under a short lock and the lock is released before
//!   any delivery. A listener added during an emit does not see that event; a listener
//!   removed during an emit may still see it.
//! - **Non-blocking**: `emit()` enqueues and returns; it never waits for a listener.
//! - **Lossless**: every listener in the snapshot gets the event, however slow it is.
//!   Queues grow with the backlog of a slow listener.
//! - **Per-listener FIFO**: each listener sees events in emission order.
//! - **No cross-listener ordering**.
//! - **Isolation**: a panicking listener is logged and keeps receiving later events.
//! - Listeners may call back into the bus (subscribe, emit) from `on_event`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;
use crate::subscribers::{Subscribe, SubscribeFn};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Per-listener channel metadata.
#[derive(Clone)]
struct Listener {
    id: ListenerId,
    name: &'static str,
    sender: mpsc::UnboundedSender<Arc<Event>>,
}

#[derive(Default)]
struct Inner {
    listeners: Mutex<Arc<Vec<Listener>>>,
    workers: Mutex<Vec<(ListenerId, JoinHandle<()>)>>,
    next_id: AtomicU64,
}

/// Broadcast bus for [`Event`]s.
///
/// Cheap to clone: clones share the same listener list.
///
/// Subscribing spawns a worker on the current tokio runtime.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and spawns its worker.
    ///
    /// The listener receives every event emitted after this call returns.
    pub fn subscribe(&self, listener: Arc<dyn Subscribe>) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let name = listener.name();
        let (tx, rx) = mpsc::unbounded_channel::<Arc<Event>>();
        let handle = tokio::spawn(drive_listener(listener, rx));

        self.inner.workers.lock().push((id, handle));
        {
            let mut guard = self.inner.listeners.lock();
            let mut next = Vec::with_capacity(guard.len() + 1);
            next.extend(guard.iter().cloned());
            next.push(Listener {
                id,
                name,
                sender: tx,
            });
            *guard = Arc::new(next);
        }

        tracing::debug!(listener = name, id = id.0, "listener subscribed");
        id
    }

    /// Registers a closure `Fn(&Event)` as a listener.
    pub fn subscribe_fn<F>(&self, name: &'static str, f: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(SubscribeFn::new(name, f)))
    }

    /// Removes a listener. Returns `false` if the id is unknown.
    ///
    /// Events already queued for the listener are still delivered; its worker exits
    /// once the queue is drained.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        {
            let mut guard = self.inner.listeners.lock();
            if !guard.iter().any(|l| l.id == id) {
                return false;
            }
            let next: Vec<Listener> = guard.iter().filter(|l| l.id != id).cloned().collect();
            *guard = Arc::new(next);
        }
        self.inner.workers.lock().retain(|(wid, _)| *wid != id);

        tracing::debug!(id = id.0, "listener unsubscribed");
        true
    }

    /// Broadcasts one event to every current listener (fire-and-forget).
    ///
    /// A listener whose worker has already stopped (unsubscribed and drained, or closed)
    /// is skipped with a warning.
    pub fn emit(&self, event: Event) {
        let snapshot = Arc::clone(&*self.inner.listeners.lock());
        if snapshot.is_empty() {
            return;
        }

        let ev = Arc::new(event);
        for listener in snapshot.iter() {
            if listener.sender.send(Arc::clone(&ev)).is_err() {
                tracing::warn!(
                    listener = listener.name,
                    seq = ev.seq,
                    "listener dropped event: worker closed"
                );
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Removes all listeners and waits until their queued events are processed.
    pub async fn close(&self) {
        drop(std::mem::take(&mut *self.inner.listeners.lock()));
        let workers = std::mem::take(&mut *self.inner.workers.lock());
        for (_, handle) in workers {
            let _ = handle.await;
        }
    }
}

/// Worker loop: delivers queued events to one listener until its queue closes.
async fn drive_listener(
    listener: Arc<dyn Subscribe>,
    mut rx: mpsc::UnboundedReceiver<Arc<Event>>,
) {
    while let Some(ev) = rx.recv().await {
        let fut = listener.on_event(ev.as_ref());
        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            tracing::error!(
                listener = listener.name(),
                seq = ev.seq,
                panic = %panic_message(panic.as_ref()),
                "listener panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
