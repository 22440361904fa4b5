//! # Signal sources.
//!
//! [`OsSignals`] listens to the process signals; [`ChannelSignals`] is fed in-process.
//!
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGHUP`.
//!
//! **Other platforms:** Ctrl-C only (reported as [`LifecycleSignal::Interrupt`]).

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::LifecycleSignal;

/// Stream of lifecycle signals. `None` means the source has ended.
#[async_trait]
pub trait SignalSource: Send + 'static {
    async fn next(&mut self) -> Option<LifecycleSignal>;
}

/// Signals received by this process.
#[cfg(unix)]
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Installs the handlers. Fails if a handler cannot be registered.
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }
}

#[cfg(unix)]
#[async_trait]
impl SignalSource for OsSignals {
    async fn next(&mut self) -> Option<LifecycleSignal> {
        tokio::select! {
            s = self.interrupt.recv() => s.map(|_| LifecycleSignal::Interrupt),
            s = self.terminate.recv() => s.map(|_| LifecycleSignal::Terminate),
            s = self.hangup.recv() => s.map(|_| LifecycleSignal::Hangup),
        }
    }
}

/// Signals received by this process.
#[cfg(not(unix))]
pub struct OsSignals {
    _priv: (),
}

#[cfg(not(unix))]
impl OsSignals {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { _priv: () })
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for OsSignals {
    async fn next(&mut self) -> Option<LifecycleSignal> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| LifecycleSignal::Interrupt)
    }
}

/// In-process signal source; ends when every sender is dropped.
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<LifecycleSignal>,
}

impl ChannelSignals {
    /// Returns the sending half and the source.
    pub fn pair() -> (mpsc::UnboundedSender<LifecycleSignal>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn next(&mut self) -> Option<LifecycleSignal> {
        self.rx.recv().await
    }
}
