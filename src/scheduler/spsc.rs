/*!
 * SPSC Task Queue
 * Bounded single-producer/single-consumer ring with spinning endpoints
 */

use super::SpinBackoff;
use crossbeam_queue::ArrayQueue;

/// Bounded SPSC ring for scheduler tasks
///
/// The driver thread is the only producer and the owning worker the only
/// consumer. Both endpoints are lock-free; blocking semantics come from a
/// bounded spin that falls back to yielding, so an idle worker burns a
/// core briefly rather than parking. The intended workloads keep queues
/// hot.
pub struct SpscQueue<T> {
    ring: ArrayQueue<T>,
}

impl<T> SpscQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            ring: ArrayQueue::new(capacity),
        }
    }

    /// Enqueue, spinning while the ring is full
    pub fn push(&self, item: T) {
        let mut item = item;
        let mut backoff = SpinBackoff::new();
        loop {
            match self.ring.push(item) {
                Ok(()) => return,
                Err(rejected) => {
                    item = rejected;
                    backoff.snooze();
                }
            }
        }
    }

    /// Dequeue, spinning while the ring is empty
    pub fn pop(&self) -> T {
        let mut backoff = SpinBackoff::new();
        loop {
            if let Some(item) = self.ring.pop() {
                return item;
            }
            backoff.snooze();
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
