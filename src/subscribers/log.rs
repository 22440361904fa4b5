//! # LogWriter: mirrors events into `tracing`
//!
//! A listener that records every incoming [`Event`] as a structured `tracing` record.
//! Error events are logged at `ERROR` (with the diagnostic output, when present),
//! everything else at `INFO`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  event kind=service-registered seq=3 msg="Service 'Billing' registered"
//! INFO  event kind=global-definition-updated seq=4 msg="Global definition updated for service 'Billing'"
//! ERROR event kind=error seq=5 msg="failed to regenerate code: 'protoc' exited with status 1" diagnostic="..."
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer listener.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::Error => match e.diagnostic() {
                Some(diag) => tracing::error!(
                    kind = %e.kind,
                    seq = e.seq,
                    task,
                    diagnostic = diag,
                    "{}",
                    e.message
                ),
                None => tracing::error!(kind = %e.kind, seq = e.seq, task, "{}", e.message),
            },
            EventKind::ServiceRegistered => match e.service() {
                Some((name, meta)) => tracing::info!(
                    kind = %e.kind,
                    seq = e.seq,
                    service = name,
                    domain = %meta.domain,
                    version = %meta.version,
                    "{}",
                    e.message
                ),
                None => tracing::info!(kind = %e.kind, seq = e.seq, "{}", e.message),
            },
            _ => tracing::info!(kind = %e.kind, seq = e.seq, task, "{}", e.message),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
