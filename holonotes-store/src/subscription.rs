//! Scoped push-signal subscription.

use holonotes_core::Signal;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Outcome of waiting on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalRecv {
    Signal(Signal),
    /// The subscriber fell behind and this many signals were dropped.
    Lagged(u64),
    /// The channel is gone; no further signals will arrive.
    Closed,
}

/// Handle on the push channel. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SignalSubscription {
    receiver: broadcast::Receiver<Signal>,
}

impl SignalSubscription {
    pub fn new(receiver: broadcast::Receiver<Signal>) -> Self {
        Self { receiver }
    }

    /// Wait for the next signal.
    pub async fn recv(&mut self) -> SignalRecv {
        match self.receiver.recv().await {
            Ok(signal) => SignalRecv::Signal(signal),
            Err(RecvError::Lagged(skipped)) => SignalRecv::Lagged(skipped),
            Err(RecvError::Closed) => SignalRecv::Closed,
        }
    }

    /// Next already-delivered signal, without waiting.
    pub fn try_recv(&mut self) -> Option<SignalRecv> {
        match self.receiver.try_recv() {
            Ok(signal) => Some(SignalRecv::Signal(signal)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Lagged(skipped)) => Some(SignalRecv::Lagged(skipped)),
            Err(TryRecvError::Closed) => Some(SignalRecv::Closed),
        }
    }
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        tracing::debug!("signal subscription released");
    }
}
