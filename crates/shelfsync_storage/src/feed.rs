//! Change feed shared by store implementations.
//!
//! Each subscriber owns an unbounded channel. Emitting never blocks the
//! writer, so a store can publish a change while still holding its data
//! lock and subscribers see changes in exactly the order they were applied.

use crate::store::ChangeSet;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Distributes [`ChangeSet`]s to subscribers.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<UnboundedSender<ChangeSet>>>,
}

impl ChangeFeed {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to all future change sets.
    pub fn subscribe(&self) -> UnboundedReceiver<ChangeSet> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Sends `change` to every live subscriber, dropping closed ones.
    /// Empty change sets are not emitted.
    pub fn emit(&self, change: ChangeSet) {
        if change.is_empty() {
            return;
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}
