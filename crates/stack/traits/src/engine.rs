//! The build-notification channel between a backend and the engine.

use tokio::sync::mpsc;

/// Messages a VM sends up to the consensus engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineMessage {
    /// The mempool holds work; the engine should call build.
    PendingTxs,
}

/// Sending half of the engine channel.
///
/// The channel holds a single slot: the signal is level-triggered intent,
/// not a counter, so a notify that finds the slot occupied is dropped.
#[derive(Clone, Debug)]
pub struct EngineSender {
    tx: mpsc::Sender<EngineMessage>,
}

impl EngineSender {
    /// Signal the engine that a build is possible, without blocking.
    ///
    /// Returns whether the signal was placed in the slot; `false` means a
    /// previous signal is still pending, which already implies a build.
    pub fn notify(&self) -> bool {
        self.tx.try_send(EngineMessage::PendingTxs).is_ok()
    }
}

/// Receiving half of the engine channel, polled by the consensus driver.
pub type EngineReceiver = mpsc::Receiver<EngineMessage>;

/// Create the capacity-1 signal channel wired into a backend at initialize.
pub fn engine_channel() -> (EngineSender, EngineReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (EngineSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_fills_slot() {
        let (tx, mut rx) = engine_channel();
        assert!(tx.notify());
        assert_eq!(rx.recv().await, Some(EngineMessage::PendingTxs));
    }

    #[tokio::test]
    async fn notify_coalesces() {
        let (tx, mut rx) = engine_channel();
        assert!(tx.notify());
        assert!(!tx.notify());

        assert_eq!(rx.try_recv().ok(), Some(EngineMessage::PendingTxs));
        assert!(rx.try_recv().ok().is_none());
    }

    #[tokio::test]
    async fn slot_rearms_after_recv() {
        let (tx, mut rx) = engine_channel();
        assert!(tx.notify());
        let _ = rx.recv().await;
        assert!(tx.notify());
    }
}
