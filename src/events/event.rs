//! # Events emitted by the registration workflow and the cluster runner.
//!
//! The [`EventKind`] enum classifies events:
//! - **Generic outcomes**: `Success`, `Error`, `Info`
//! - **Domain events**: `ServiceRegistered`, `GlobalDefinitionUpdated`, `CodeGenerated`
//!
//! The [`Event`] struct carries a message, an optional task name and an optional
//! [`Payload`] (service metadata, or raw diagnostic output of a failing process).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order across listeners.
//!
//! ## Example
//! ```rust
//! use protovisor::{Event, EventKind};
//!
//! let ev = Event::error("failed to regenerate code")
//!     .with_task("generate:billing")
//!     .with_diagnostic("billing.proto:4:1: syntax error");
//!
//! assert_eq!(ev.kind, EventKind::Error);
//! assert_eq!(ev.task.as_deref(), Some("generate:billing"));
//! assert_eq!(ev.diagnostic(), Some("billing.proto:4:1: syntax error"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::registry::ServiceMetadata;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An operation or task completed successfully.
    Success,
    /// An operation or task failed. May carry [`Payload::Diagnostic`].
    Error,
    /// Informational progress.
    Info,
    /// A service was accepted by the registry. Carries [`Payload::Service`].
    ServiceRegistered,
    /// A service stub was appended to the shared definition file.
    GlobalDefinitionUpdated,
    /// Code generation finished successfully.
    CodeGenerated,
}

impl EventKind {
    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::Info => "info",
            EventKind::ServiceRegistered => "service-registered",
            EventKind::GlobalDefinitionUpdated => "global-definition-updated",
            EventKind::CodeGenerated => "code-generated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional structured data attached to an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The service a `ServiceRegistered` event is about.
    Service {
        /// Service name.
        name: Arc<str>,
        /// Registered metadata.
        metadata: ServiceMetadata,
    },
    /// Raw output of a failing external process.
    Diagnostic(Arc<str>),
}

/// Event record delivered to listeners.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Human-readable message.
    pub message: Arc<str>,
    /// Name of the task that produced the event, if any.
    pub task: Option<Arc<str>>,
    /// Optional structured payload.
    pub payload: Option<Payload>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind, message: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            message: message.into(),
            task: None,
            payload: None,
        }
    }

    #[inline]
    pub fn success(message: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Success, message)
    }

    #[inline]
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Error, message)
    }

    #[inline]
    pub fn info(message: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Info, message)
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attaches raw process output as [`Payload::Diagnostic`].
    #[inline]
    pub fn with_diagnostic(self, output: impl Into<Arc<str>>) -> Self {
        self.with_payload(Payload::Diagnostic(output.into()))
    }

    /// Raw diagnostic output, if this event carries any.
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Diagnostic(out)) => Some(&**out),
            _ => None,
        }
    }

    /// Service name and metadata, if this event carries them.
    pub fn service(&self) -> Option<(&str, &ServiceMetadata)> {
        match &self.payload {
            Some(Payload::Service { name, metadata }) => Some((&**name, metadata)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, EventKind::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::info("a");
        let b = Event::info("b");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn service_payload_roundtrips_through_accessor() {
        let meta = ServiceMetadata::new("payments", "v2");
        let ev = Event::new(EventKind::ServiceRegistered, "Service 'Billing' registered")
            .with_payload(Payload::Service {
                name: "Billing".into(),
                metadata: meta.clone(),
            });
        assert_eq!(ev.service(), Some(("Billing", &meta)));
        assert_eq!(ev.diagnostic(), None);
        assert!(!ev.is_error());
    }
}
