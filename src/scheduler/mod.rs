/*!
 * Central Scheduler
 * Worker threads with private sub-trees fed through per-worker queues
 */

mod decentralized;
mod queue;
mod spsc;
mod task;

pub use decentralized::DecentralizedExecutor;
pub use queue::BlockingQueue;
pub use spsc::SpscQueue;
pub use task::Task;

use crate::core::errors::{check_dimensions, ConfigError};
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult, Value, WorkerId};
use crate::tree::FenwickTree;
use log::debug;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Per-worker queue depth; the bound is the driver's back-pressure
const TASK_QUEUE_DEPTH: usize = 8192;

/// Bounded spin that falls back to yielding
///
/// Used by the SPSC endpoints and by the driver's sync wait, where the
/// expected wait is a few queue drains.
pub(crate) struct SpinBackoff {
    spins: u32,
}

impl SpinBackoff {
    pub(crate) fn new() -> Self {
        Self { spins: 0 }
    }

    pub(crate) fn snooze(&mut self) {
        if self.spins < 100 {
            std::hint::spin_loop();
        } else {
            thread::yield_now();
        }
        self.spins = self.spins.wrapping_add(1);
    }
}

/// Queue seam between the two scheduler variants
pub trait TaskQueue: Send + Sync + 'static {
    fn with_capacity(capacity: usize) -> Self;
    fn push(&self, task: Task);
    fn pop(&self) -> Task;
}

impl TaskQueue for BlockingQueue<Task> {
    fn with_capacity(capacity: usize) -> Self {
        BlockingQueue::with_capacity(capacity)
    }

    fn push(&self, task: Task) {
        BlockingQueue::push(self, task)
    }

    fn pop(&self) -> Task {
        BlockingQueue::pop(self)
    }
}

impl TaskQueue for SpscQueue<Task> {
    fn with_capacity(capacity: usize) -> Self {
        SpscQueue::with_capacity(capacity)
    }

    fn push(&self, task: Task) {
        SpscQueue::push(self, task)
    }

    fn pop(&self) -> Task {
        SpscQueue::pop(self)
    }
}

/// Task-dispatch batch executor with private per-worker sub-trees
///
/// Updates round-robin to one worker; queries broadcast to all. Each
/// worker owns a sequential Fenwick tree holding only the updates routed
/// to it, so the per-query answer is the sum of all workers' partials,
/// aggregated by atomic add into the positional results vector.
///
/// Per-queue FIFO order carries the correctness argument: everything the
/// driver submitted before a query sits ahead of that query in each
/// worker's queue, so each partial reflects exactly the updates that
/// preceded the query in submission order. Cross-worker ordering is never
/// needed.
pub struct Scheduler<Q: TaskQueue> {
    queues: Vec<Arc<Q>>,
    workers: Vec<JoinHandle<()>>,
    results: Arc<Vec<AtomicI32>>,
    sync_counter: Arc<AtomicUsize>,
    round_robin: usize,
    batch_size: usize,
}

/// Blocking-FIFO scheduler variant
pub type CentralScheduler = Scheduler<BlockingQueue<Task>>;

/// SPSC-ring scheduler variant; identical contract, lock-free queues
pub type LockFreeScheduler = Scheduler<SpscQueue<Task>>;

impl<Q: TaskQueue> Scheduler<Q> {
    pub fn new(n: usize, workers: usize, batch_size: usize) -> ConfigResult<Self> {
        check_dimensions(n, workers)?;
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        let results: Arc<Vec<AtomicI32>> =
            Arc::new((0..batch_size).map(|_| AtomicI32::new(0)).collect());
        let sync_counter = Arc::new(AtomicUsize::new(0));
        let queues: Vec<Arc<Q>> = (0..workers)
            .map(|_| Arc::new(Q::with_capacity(TASK_QUEUE_DEPTH)))
            .collect();

        let handles: Vec<JoinHandle<()>> = queues
            .iter()
            .enumerate()
            .map(|(worker, queue)| {
                let queue = Arc::clone(queue);
                let results = Arc::clone(&results);
                let sync_counter = Arc::clone(&sync_counter);
                let tree = FenwickTree::new(n);
                thread::spawn(move || worker_loop(worker, &*queue, tree, &results, &sync_counter))
            })
            .collect();

        Ok(Self {
            queues,
            workers: handles,
            results,
            sync_counter,
            round_robin: 0,
            batch_size,
        })
    }

    /// Route one update to the next worker in round-robin order
    pub fn submit_update(&mut self, index: usize, value: Value) {
        let worker = self.round_robin % self.queues.len();
        self.round_robin += 1;
        self.queues[worker].push(Task::Update { index, value });
    }

    /// Broadcast one query; partials aggregate into `results[position]`
    pub fn submit_query(&mut self, index: usize, position: usize) {
        debug_assert!(position < self.batch_size, "position {} out of range", position);
        self.broadcast(Task::Query { index, position });
    }

    /// Zero the results vector and the sync counter before a batch
    pub fn init(&mut self) {
        for slot in self.results.iter() {
            slot.store(0, Ordering::Relaxed);
        }
        self.sync_counter.store(0, Ordering::Relaxed);
    }

    /// Drain every queue: broadcast a barrier and wait for all workers
    ///
    /// The acquire load pairs with each worker's release increment, making
    /// every result written before the acknowledgment visible here.
    pub fn sync(&mut self) {
        self.broadcast(Task::Sync);
        let expected = self.workers.len();
        let mut backoff = SpinBackoff::new();
        while self.sync_counter.load(Ordering::Acquire) < expected {
            if self.workers.iter().any(|handle| handle.is_finished()) {
                self.reap_dead_workers();
            }
            backoff.snooze();
        }
        self.sync_counter.store(0, Ordering::Relaxed);
    }

    /// Sum of every query result in the current batch
    pub fn validate_sum(&self) -> Value {
        self.results
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .sum()
    }

    /// Broadcast `Finish` and join every worker
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.broadcast(Task::Finish);
        for handle in self.workers.drain(..) {
            if let Err(payload) = handle.join() {
                std::panic::resume_unwind(payload);
            }
        }
    }

    fn broadcast(&self, task: Task) {
        for queue in &self.queues {
            queue.push(task);
        }
    }

    /// A worker exiting mid-batch is fatal; surface its panic to the driver
    fn reap_dead_workers(&mut self) {
        let mut alive = Vec::with_capacity(self.workers.len());
        for handle in self.workers.drain(..) {
            if handle.is_finished() {
                if let Err(payload) = handle.join() {
                    std::panic::resume_unwind(payload);
                }
                panic!("scheduler worker exited before shutdown");
            }
            alive.push(handle);
        }
        self.workers = alive;
    }
}

impl<Q: TaskQueue> BatchExecutor for Scheduler<Q> {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        assert!(
            batch.len() <= self.batch_size,
            "batch of {} exceeds configured batch size {}",
            batch.len(),
            self.batch_size
        );

        self.init();
        let mut query_positions = Vec::new();
        for (pos, op) in batch.iter().enumerate() {
            match *op {
                Operation::Add { index, value } => self.submit_update(index, value),
                Operation::Query { index } => {
                    query_positions.push(pos);
                    self.submit_query(index, pos);
                }
            }
        }
        self.sync();

        query_positions
            .into_iter()
            .map(|position| QueryResult {
                position,
                value: self.results[position].load(Ordering::Relaxed),
            })
            .collect()
    }
}

impl<Q: TaskQueue> Drop for Scheduler<Q> {
    fn drop(&mut self) {
        // When unwinding from a dead worker, its queue may never drain;
        // skip the broadcast rather than block the unwind.
        if thread::panicking() {
            return;
        }
        self.shutdown();
    }
}

/// Worker body: apply routed updates to the private sub-tree, answer
/// broadcast queries with this tree's partial, acknowledge barriers
fn worker_loop<Q: TaskQueue>(
    worker: WorkerId,
    queue: &Q,
    mut tree: FenwickTree,
    results: &[AtomicI32],
    sync_counter: &AtomicUsize,
) {
    debug!("scheduler worker {} started", worker);
    loop {
        match queue.pop() {
            Task::Update { index, value } => tree.add(index, value),
            Task::Query { index, position } => {
                results[position].fetch_add(tree.sum(index), Ordering::Relaxed);
            }
            Task::Sync => {
                sync_counter.fetch_add(1, Ordering::Release);
            }
            Task::Finish => break,
        }
    }
    debug!("scheduler worker {} finished", worker);
}
