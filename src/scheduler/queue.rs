/*!
 * Blocking Task Queue
 * Bounded FIFO with condvar-based producer and consumer blocking
 */

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Bounded multi-producer FIFO
///
/// `push` blocks while the queue is full, `pop` while it is empty;
/// back-pressure on the submitting driver is the bound itself. There is no
/// close operation: shutdown travels in-band as a task.
pub struct BlockingQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BlockingQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue, blocking while the queue is at capacity
    pub fn push(&self, item: T) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            self.not_full.wait(&mut queue);
        }
        queue.push_back(item);
        drop(queue);
        self.not_empty.notify_one();
    }

    /// Enqueue without blocking; returns the item back when full
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut queue = self.inner.lock();
        if queue.len() >= self.capacity {
            return Err(item);
        }
        queue.push_back(item);
        drop(queue);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue, blocking while the queue is empty
    pub fn pop(&self) -> T {
        let mut queue = self.inner.lock();
        loop {
            if let Some(item) = queue.pop_front() {
                drop(queue);
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BlockingQueue::with_capacity(8);
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.pop(), 3);
    }

    #[test]
    fn test_try_push_full() {
        let queue = BlockingQueue::with_capacity(2);
        assert!(queue.try_push(1).is_ok());
        assert!(queue.try_push(2).is_ok());
        assert_eq!(queue.try_push(3), Err(3));
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(BlockingQueue::with_capacity(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(42u32);
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn test_push_blocks_until_pop() {
        let queue = Arc::new(BlockingQueue::with_capacity(1));
        queue.push(1u32);

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.pop(), 1);
        producer.join().unwrap();
        assert_eq!(queue.pop(), 2);
    }
}
