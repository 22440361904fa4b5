//! # LifecycleSignalController: signal → action loop.
//!
//! ```text
//!            ┌──────────── Reload delivered ◄──────────┐
//!            ▼                                          │
//!       Listening ── signal ──► Delivering ── send ─────┤
//!            │                      │                   └── Shutdown delivered ──► Terminated
//!            └── source ended / consumer gone / cancelled ────────────────────────► Terminated
//! ```
//!
//! The action queue has capacity 1: the controller waits in `Delivering` until the host
//! has taken the previous action. At most one `Shutdown` is sent per controller.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{LifecycleSignal, SignalAction, SignalSource};

/// Capacity of the action queue.
const ACTION_QUEUE_CAPACITY: usize = 1;

/// Controller loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Listening,
    Delivering,
    Terminated,
}

/// Why the controller loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerExit {
    /// A termination signal was delivered as `Shutdown`.
    Shutdown(LifecycleSignal),
    /// The signal source ended.
    SourceClosed,
    /// The host dropped the action receiver.
    ConsumerDropped,
    /// The cancellation token fired.
    Cancelled,
}

/// Turns signals from `S` into [`SignalAction`]s on a bounded queue.
pub struct LifecycleSignalController<S: SignalSource> {
    source: S,
    token: CancellationToken,
    state: watch::Sender<ControllerState>,
}

impl<S: SignalSource> LifecycleSignalController<S> {
    pub fn new(source: S) -> Self {
        Self::with_token(source, CancellationToken::new())
    }

    /// Stops the loop when `token` is cancelled.
    pub fn with_token(source: S, token: CancellationToken) -> Self {
        let (state, _) = watch::channel(ControllerState::Listening);
        Self {
            source,
            token,
            state,
        }
    }

    /// Observes the loop state.
    pub fn state(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    /// Spawns the loop. Returns the action queue and a handle resolving to the exit reason.
    pub fn spawn(self) -> (mpsc::Receiver<SignalAction>, JoinHandle<ControllerExit>) {
        let (tx, rx) = mpsc::channel(ACTION_QUEUE_CAPACITY);
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    async fn run(mut self, tx: mpsc::Sender<SignalAction>) -> ControllerExit {
        let exit = self.drive(&tx).await;
        self.state.send_replace(ControllerState::Terminated);
        tracing::debug!(?exit, "signal controller stopped");
        exit
    }

    async fn drive(&mut self, tx: &mpsc::Sender<SignalAction>) -> ControllerExit {
        loop {
            self.state.send_replace(ControllerState::Listening);
            let signal = tokio::select! {
                biased;
                _ = self.token.cancelled() => return ControllerExit::Cancelled,
                _ = tx.closed() => return ControllerExit::ConsumerDropped,
                s = self.source.next() => s,
            };
            let Some(signal) = signal else {
                return ControllerExit::SourceClosed;
            };

            let action = signal.action();
            tracing::info!(%signal, ?action, "lifecycle signal received");
            self.state.send_replace(ControllerState::Delivering);
            let sent = tokio::select! {
                biased;
                _ = self.token.cancelled() => return ControllerExit::Cancelled,
                r = tx.send(action) => r,
            };
            if sent.is_err() {
                return ControllerExit::ConsumerDropped;
            }
            if action == SignalAction::Shutdown {
                return ControllerExit::Shutdown(signal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::ChannelSignals;
    use std::time::Duration;

    #[tokio::test]
    async fn hangups_reload_and_termination_shuts_down_once() {
        let (signals, source) = ChannelSignals::pair();
        let (mut actions, handle) = LifecycleSignalController::new(source).spawn();

        signals.send(LifecycleSignal::Hangup).unwrap();
        signals.send(LifecycleSignal::Hangup).unwrap();
        signals.send(LifecycleSignal::Terminate).unwrap();
        signals.send(LifecycleSignal::Interrupt).unwrap();

        assert_eq!(actions.recv().await, Some(SignalAction::Reload));
        assert_eq!(actions.recv().await, Some(SignalAction::Reload));
        assert_eq!(actions.recv().await, Some(SignalAction::Shutdown));
        assert_eq!(actions.recv().await, None);
        assert_eq!(
            handle.await.unwrap(),
            ControllerExit::Shutdown(LifecycleSignal::Terminate)
        );
    }

    #[tokio::test]
    async fn ended_source_stops_the_loop() {
        let (signals, source) = ChannelSignals::pair();
        let (mut actions, handle) = LifecycleSignalController::new(source).spawn();
        drop(signals);

        assert_eq!(actions.recv().await, None);
        assert_eq!(handle.await.unwrap(), ControllerExit::SourceClosed);
    }

    #[tokio::test]
    async fn dropped_consumer_stops_the_loop() {
        let (_signals, source) = ChannelSignals::pair();
        let (actions, handle) = LifecycleSignalController::new(source).spawn();
        drop(actions);

        let exit = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exit, ControllerExit::ConsumerDropped);
    }

    #[tokio::test]
    async fn cancellation_stops_a_blocked_delivery() {
        let (signals, source) = ChannelSignals::pair();
        let token = CancellationToken::new();
        let ctrl = LifecycleSignalController::with_token(source, token.clone());
        let mut state = ctrl.state();
        let (_actions, handle) = ctrl.spawn();

        // The first Reload fills the queue; the second one blocks in Delivering.
        signals.send(LifecycleSignal::Hangup).unwrap();
        signals.send(LifecycleSignal::Hangup).unwrap();
        tokio::time::timeout(
            Duration::from_secs(1),
            state.wait_for(|s| *s == ControllerState::Delivering),
        )
        .await
        .unwrap()
        .unwrap();

        token.cancel();
        assert_eq!(handle.await.unwrap(), ControllerExit::Cancelled);
        assert_eq!(*state.borrow(), ControllerState::Terminated);
    }

    #[test]
    fn signal_classes() {
        assert_eq!(LifecycleSignal::Interrupt.action(), SignalAction::Shutdown);
        assert_eq!(LifecycleSignal::Terminate.action(), SignalAction::Shutdown);
        assert_eq!(LifecycleSignal::Hangup.action(), SignalAction::Reload);
    }
}
