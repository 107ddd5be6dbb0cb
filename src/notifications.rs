//! Queue of unsolicited `+IOTRECEIVE:` lines.
//!
//! The driver appends to the queue whenever it classifies a receive
//! notification, whether that happens while a command is waiting for its
//! answer or during an idle [`poll`](crate::ThingstreamClick::poll). Handles
//! are cheap clones over one shared buffer, so a consumer on another thread
//! can drain messages while the driver is between commands.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Default)]
struct QueueState {
    entries: VecDeque<String>,
    capacity: Option<usize>,
    dropped: u64,
}

/// FIFO of raw notification lines, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    state: Arc<Mutex<QueueState>>,
}

impl NotificationQueue {
    /// An unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that keeps at most `capacity` entries, discarding the oldest
    /// on overflow and counting each discard.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                capacity: Some(capacity.max(1)),
                ..Default::default()
            })),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut state = self.state.lock();
        if let Some(capacity) = state.capacity {
            if state.entries.len() >= capacity {
                state.entries.pop_front();
                state.dropped += 1;
                warn!(
                    "Notification queue full ({} entries), dropped oldest message",
                    capacity
                );
            }
        }
        state.entries.push_back(line.into());
    }

    /// True iff at least one message is waiting.
    pub fn has_message(&self) -> bool {
        !self.state.lock().entries.is_empty()
    }

    /// Remove and return the oldest message, or an empty string if none.
    pub fn take_message(&self) -> String {
        self.state.lock().entries.pop_front().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Remove and return every waiting message in arrival order.
    pub fn drain(&self) -> Vec<String> {
        self.state.lock().entries.drain(..).collect()
    }
}
