//! Queue-keyed message dispatch.
//!
//! Producers that live on other threads (media decoders, mutation observers,
//! viewport notifications) never touch layout state directly. They publish a
//! message into a [`SubscriberRegistry`], which clones it into every
//! subscribed delivery queue. The owner of a queue drains it on its own
//! thread, between passes.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Identifies one delivery queue in a [`SubscriberRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(pub u64);

/// The receiving end of a delivery queue, owned by a single execution context.
#[derive(Debug)]
pub struct MessageQueue<M> {
    id: QueueId,
    receiver: Receiver<M>,
}

impl<M> MessageQueue<M> {
    /// Create a detached queue and the sender that feeds it.
    #[must_use]
    pub fn new(id: QueueId) -> (Sender<M>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { id, receiver })
    }

    /// The id this queue was created with.
    #[must_use]
    pub const fn id(&self) -> QueueId {
        self.id
    }

    /// Take every message currently waiting, in arrival order, without
    /// blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<M> {
        let mut batch = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => batch.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        batch
    }
}

/// Fan-out registry: one sender per subscribed queue.
///
/// The registry is `Sync` so producers on any thread may publish through a
/// shared reference. Queues whose receiver has been dropped are pruned on the
/// next publish.
#[derive(Debug)]
pub struct SubscriberRegistry<M> {
    subscribers: Mutex<BTreeMap<QueueId, Sender<M>>>,
    next_id: AtomicU64,
}

impl<M: Clone> SubscriberRegistry<M> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Open a new delivery queue and register it.
    #[must_use]
    pub fn subscribe(&self) -> MessageQueue<M> {
        let id = QueueId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, queue) = MessageQueue::new(id);
        let _ = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        queue
    }

    /// Remove a queue. Returns false if it was not registered.
    #[must_use]
    pub fn unsubscribe(&self, id: QueueId) -> bool {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Deliver `message` to every live queue, in queue-id order.
    ///
    /// Returns the number of queues that accepted it.
    #[must_use]
    pub fn publish(&self, message: &M) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;
        subscribers.retain(|id, sender| {
            if sender.send(message.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                log::debug!(target: "dispatch", "pruning closed queue {}", id.0);
                false
            }
        });
        delivered
    }

    /// Number of registered queues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no queue is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Clone> Default for SubscriberRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
