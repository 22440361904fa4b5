//! # Lifecycle signals.
//!
//! Translates process signals into actions for the host loop:
//!
//! ```text
//! SignalSource ──► LifecycleSignalController ──► mpsc (cap 1) ──► host
//!   Interrupt ─┐
//!   Terminate ─┴──► Shutdown   (single-shot, controller exits)
//!   Hangup    ─────► Reload    (repeatable)
//! ```
//!
//! - [`source`]: [`SignalSource`] with [`OsSignals`] and [`ChannelSignals`];
//! - [`controller`]: [`LifecycleSignalController`] and its exit reasons.

mod controller;
mod source;

pub use controller::{ControllerExit, ControllerState, LifecycleSignalController};
pub use source::{ChannelSignals, OsSignals, SignalSource};

use std::fmt;

/// Process signals the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
    /// `SIGHUP`.
    Hangup,
}

impl LifecycleSignal {
    /// Action requested by this signal.
    pub fn action(&self) -> SignalAction {
        match self {
            LifecycleSignal::Interrupt | LifecycleSignal::Terminate => SignalAction::Shutdown,
            LifecycleSignal::Hangup => SignalAction::Reload,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleSignal::Interrupt => "SIGINT",
            LifecycleSignal::Terminate => "SIGTERM",
            LifecycleSignal::Hangup => "SIGHUP",
        }
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalAction {
    Shutdown,
    Reload,
}
