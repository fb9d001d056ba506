//! Bounded build mempool with a level-triggered engine signal.

use std::{collections::VecDeque, sync::Arc};

use keel_traits::EngineSender;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

/// Default number of pending items a mempool holds.
pub const DEFAULT_MEMPOOL_CAPACITY: usize = 100;

/// Error type for mempool operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MempoolError {
    /// The queue is at capacity; the item was dropped.
    #[error("mempool full at capacity {capacity}")]
    Full {
        /// Configured queue capacity.
        capacity: usize,
    },
}

#[derive(Debug)]
struct Inner<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
    engine: Mutex<Option<EngineSender>>,
}

/// A bounded FIFO of pending payload fingerprints.
///
/// `add` is called from RPC threads concurrently with the consensus driver;
/// the queue is the only shared-mutable state and sits behind a mutex. Each
/// successful enqueue emits a [`PendingTxs`] signal on the engine channel;
/// the channel's single slot coalesces racing signals, and
/// [`Mempool::notify_build_block`] re-arms the signal after every build
/// attempt so progress is guaranteed whenever the queue is non-empty.
///
/// [`PendingTxs`]: keel_traits::EngineMessage::PendingTxs
#[derive(Debug)]
pub struct Mempool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Mempool<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Copy + Send + 'static> Mempool<T> {
    /// Create an empty mempool holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity,
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                engine: Mutex::new(None),
            }),
        }
    }

    /// Wire the engine signal channel into this mempool.
    ///
    /// Until a sender is attached, adds enqueue without signaling.
    pub fn attach_engine(&self, engine: EngineSender) {
        *self.inner.engine.lock() = Some(engine);
    }

    /// Enqueue `item` without blocking and signal the engine.
    ///
    /// The signal is emitted only after the enqueue succeeded, so the engine
    /// never wakes for an item that was dropped.
    pub fn add(&self, item: T) -> Result<(), MempoolError> {
        {
            let mut queue = self.inner.queue.lock();
            if queue.len() >= self.inner.capacity {
                warn!(capacity = self.inner.capacity, "mempool full, dropping item");
                return Err(MempoolError::Full { capacity: self.inner.capacity });
            }
            queue.push_back(item);
        }
        self.notify_engine();
        Ok(())
    }

    /// Dequeue the next pending item without blocking.
    pub fn pending(&self) -> Option<T> {
        self.inner.queue.lock().pop_front()
    }

    /// Re-emit the build signal if work remains.
    ///
    /// Called after every build attempt: a signal lost to the channel slot
    /// is recovered here as long as the queue is non-empty.
    pub fn notify_build_block(&self) {
        if !self.is_empty() {
            self.notify_engine();
        }
    }

    /// Current queue length.
    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Configured queue capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    fn notify_engine(&self) {
        if let Some(engine) = self.inner.engine.lock().as_ref() {
            engine.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use keel_traits::{engine_channel, EngineMessage};

    use super::*;

    #[test]
    fn fifo_order() {
        let mempool = Mempool::new(4);
        mempool.add(1u32).unwrap();
        mempool.add(2).unwrap();
        mempool.add(3).unwrap();

        assert_eq!(mempool.len(), 3);
        assert_eq!(mempool.pending(), Some(1));
        assert_eq!(mempool.pending(), Some(2));
        assert_eq!(mempool.pending(), Some(3));
        assert_eq!(mempool.pending(), None);
    }

    #[test]
    fn overflow_returns_full() {
        let mempool = Mempool::new(2);
        mempool.add(1u32).unwrap();
        mempool.add(2).unwrap();

        assert_eq!(mempool.add(3), Err(MempoolError::Full { capacity: 2 }));
        assert_eq!(mempool.len(), 2);
    }

    #[tokio::test]
    async fn add_signals_engine() {
        let (tx, mut rx) = engine_channel();
        let mempool = Mempool::new(4);
        mempool.attach_engine(tx);

        mempool.add(7u32).unwrap();
        assert_eq!(rx.try_recv().ok(), Some(EngineMessage::PendingTxs));
    }

    #[tokio::test]
    async fn signals_coalesce() {
        let (tx, mut rx) = engine_channel();
        let mempool = Mempool::new(4);
        mempool.attach_engine(tx);

        mempool.add(1u32).unwrap();
        mempool.add(2).unwrap();
        mempool.add(3).unwrap();

        assert_eq!(rx.try_recv().ok(), Some(EngineMessage::PendingTxs));
        assert!(rx.try_recv().ok().is_none());
    }

    #[tokio::test]
    async fn rejected_add_does_not_signal() {
        let (tx, mut rx) = engine_channel();
        let mempool = Mempool::new(1);
        mempool.attach_engine(tx);

        mempool.add(1u32).unwrap();
        let _ = rx.try_recv();

        assert!(mempool.add(2).is_err());
        assert!(rx.try_recv().ok().is_none());
    }

    #[tokio::test]
    async fn notify_build_block_rearms_when_nonempty() {
        let (tx, mut rx) = engine_channel();
        let mempool = Mempool::new(4);
        mempool.attach_engine(tx);

        mempool.add(1u32).unwrap();
        mempool.add(2).unwrap();
        let _ = rx.try_recv();

        // One item consumed by a build; the queue still holds work.
        let _ = mempool.pending();
        mempool.notify_build_block();
        assert_eq!(rx.try_recv().ok(), Some(EngineMessage::PendingTxs));
    }

    #[tokio::test]
    async fn notify_build_block_silent_when_empty() {
        let (tx, mut rx) = engine_channel();
        let mempool = Mempool::<u32>::new(4);
        mempool.attach_engine(tx);

        mempool.notify_build_block();
        assert!(rx.try_recv().ok().is_none());
    }

    #[test]
    fn add_without_engine_still_enqueues() {
        let mempool = Mempool::new(4);
        mempool.add(9u32).unwrap();
        assert_eq!(mempool.pending(), Some(9));
    }
}
