//! Bounded FIFO of outbound telegrams.

use heapless::Deque;

use crate::error::{KnxError, Result};
use crate::telegram::Telegram;

/// Capacity of the outbound telegram queue.
pub const QUEUE_CAPACITY: usize = 16;

/// Fixed-capacity FIFO of telegrams waiting for transmission.
///
/// Value-owned ring, no allocation, no synchronization: all access happens
/// from the single cooperative task loop. Appending to a full queue is
/// rejected.
#[derive(Debug, Default)]
pub struct TelegramQueue {
    items: Deque<Telegram, QUEUE_CAPACITY>,
}

impl TelegramQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a telegram at the back.
    ///
    /// # Errors
    ///
    /// Returns [`KnxError::QueueFull`] when the queue already holds
    /// [`QUEUE_CAPACITY`] telegrams; the telegram is dropped.
    pub fn append(&mut self, telegram: &Telegram) -> Result<()> {
        self.items
            .push_back(*telegram)
            .map_err(|_| KnxError::QueueFull)
    }

    /// Remove and return the oldest telegram.
    pub fn pop(&mut self) -> Option<Telegram> {
        self.items.pop_front()
    }

    /// Number of queued telegrams.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram_for(target: u16) -> Telegram {
        let mut t = Telegram::new();
        t.set_target_address(target);
        t
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = TelegramQueue::new();
        queue.append(&telegram_for(0x1701)).unwrap();
        queue.append(&telegram_for(0x1702)).unwrap();
        queue.append(&telegram_for(0x1703)).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap().target_address(), 0x1701);
        assert_eq!(queue.pop().unwrap().target_address(), 0x1702);
        assert_eq!(queue.pop().unwrap().target_address(), 0x1703);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_rejects_on_full() {
        let mut queue = TelegramQueue::new();
        for i in 0..QUEUE_CAPACITY {
            queue.append(&telegram_for(i as u16)).unwrap();
        }
        assert!(queue.is_full());

        let result = queue.append(&telegram_for(0xFFFF));
        assert!(matches!(result, Err(KnxError::QueueFull)));
        assert_eq!(queue.len(), QUEUE_CAPACITY);

        // order survives the rejected append
        assert_eq!(queue.pop().unwrap().target_address(), 0);
    }

    #[test]
    fn test_len_tracks_append_and_pop() {
        let mut queue = TelegramQueue::new();
        assert!(queue.is_empty());
        queue.append(&telegram_for(1)).unwrap();
        queue.append(&telegram_for(2)).unwrap();
        assert_eq!(queue.len(), 2);
        queue.pop();
        assert_eq!(queue.len(), 1);
        queue.pop();
        assert!(queue.is_empty());
    }
}
