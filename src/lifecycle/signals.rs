//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers
//! - Forward them into a single-slot channel
//! - Drive the Running → ShuttingDown → forced exit transitions
//!
//! # Design Decisions
//! - Two sequential receives, no counters: the forced exit is unreachable
//!   until the first signal has been handled
//! - The graceful shutdown action is `FnOnce`, so it cannot run twice

use std::fmt;

use tokio::sync::{mpsc, watch};

use super::exit::codes;

/// A shutdown-triggering signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("interrupt"),
            Self::Terminate => f.write_str("terminated"),
        }
    }
}

/// Where the process is in its shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    ShuttingDown,
}

/// Install SIGINT/SIGTERM handlers.
///
/// The returned channel holds at most one undelivered signal; the forwarder
/// waits for room rather than dropping.
pub fn listen() -> std::io::Result<mpsc::Receiver<Signal>> {
    let (tx, rx) = mpsc::channel(1);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            loop {
                let sig = tokio::select! {
                    Some(()) = interrupt.recv() => Signal::Interrupt,
                    Some(()) = terminate.recv() => Signal::Terminate,
                    else => break,
                };
                if tx.send(sig).await.is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(Signal::Interrupt).await.is_err() {
                    break;
                }
            }
        });
    }

    Ok(rx)
}

/// Two-stage signal state machine, run on its own task.
#[derive(Debug)]
pub struct SignalController {
    signals: mpsc::Receiver<Signal>,
    state: watch::Sender<LifecycleState>,
}

impl SignalController {
    pub fn new(signals: mpsc::Receiver<Signal>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Running);
        Self { signals, state }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Wait for signals.
    ///
    /// The first runs `shutdown`; the second runs `exit` with the
    /// double-signal code. Returns the last state reached if the signal
    /// source goes away (or if `exit` returns, as it does in tests).
    pub async fn run<S, X>(mut self, shutdown: S, exit: X) -> LifecycleState
    where
        S: FnOnce() + Send,
        X: FnOnce(i32) + Send,
    {
        let Some(first) = self.signals.recv().await else {
            return LifecycleState::Running;
        };
        tracing::info!(signal = %first, "Shutdown requested, signal again to force exit");
        self.state.send_replace(LifecycleState::ShuttingDown);
        shutdown();

        let Some(second) = self.signals.recv().await else {
            return LifecycleState::ShuttingDown;
        };
        tracing::warn!(signal = %second, "Second signal received, exiting immediately");
        exit(codes::DOUBLE_SIGNAL);
        LifecycleState::ShuttingDown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_channel_close_before_signal() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let state = SignalController::new(rx)
            .run(|| panic!("no shutdown expected"), |_| panic!("no exit expected"))
            .await;
        assert_eq!(state, LifecycleState::Running);
    }

    #[tokio::test]
    async fn test_first_signal_requests_shutdown() {
        let (tx, rx) = mpsc::channel(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let controller = SignalController::new(rx);
        let mut state = controller.state();

        tx.send(Signal::Terminate).await.unwrap();
        drop(tx);

        let c = calls.clone();
        let end = controller
            .run(move || { c.fetch_add(1, Ordering::SeqCst); }, |_| panic!("no exit expected"))
            .await;

        assert_eq!(end, LifecycleState::ShuttingDown);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*state.borrow_and_update(), LifecycleState::ShuttingDown);
    }

    #[tokio::test]
    async fn test_second_signal_forces_exit() {
        let (tx, rx) = mpsc::channel(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let exit_code = Arc::new(Mutex::new(None));

        let c = calls.clone();
        let code = exit_code.clone();
        let task = tokio::spawn(SignalController::new(rx).run(
            move || { c.fetch_add(1, Ordering::SeqCst); },
            move |status| { *code.lock().unwrap() = Some(status); },
        ));

        tx.send(Signal::Interrupt).await.unwrap();
        tx.send(Signal::Interrupt).await.unwrap();
        task.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*exit_code.lock().unwrap(), Some(codes::DOUBLE_SIGNAL));
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::Interrupt.to_string(), "interrupt");
        assert_eq!(Signal::Terminate.to_string(), "terminated");
    }
}
