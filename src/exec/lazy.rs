/*!
 * Lazy-Batch Executor
 * Defers updates and flushes the pending window in parallel at each query
 */

use super::{drain_batch, StripedApply};
use crate::core::errors::check_dimensions;
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult, Value};
use crate::tree::AtomicFenwick;
use std::thread;

/// Batch executor over an atomic-cell tree
///
/// Updates between two queries form a window. When a query is reached the
/// window is applied in parallel, which is safe because the flush contains
/// no reads and the relaxed `fetch_add`s commute. The query then runs
/// alone on the settled tree. Each query observes exactly the updates that
/// precede it in the batch.
pub struct LazyExecutor {
    tree: AtomicFenwick,
    workers: usize,
}

impl LazyExecutor {
    pub fn new(n: usize, workers: usize) -> ConfigResult<Self> {
        check_dimensions(n, workers)?;
        Ok(Self {
            tree: AtomicFenwick::new(n),
            workers,
        })
    }

    /// Apply an update-only window across the workers
    fn flush(&self, ops: &[Operation]) {
        if ops.is_empty() {
            return;
        }
        let per_worker = (ops.len() + self.workers - 1) / self.workers;
        let tree = &self.tree;
        thread::scope(|scope| {
            for chunk in ops.chunks(per_worker) {
                scope.spawn(move || {
                    for op in chunk {
                        if let Operation::Add { index, value } = *op {
                            tree.add(index, value);
                        }
                    }
                });
            }
        });
    }
}

impl StripedApply for LazyExecutor {
    fn apply_parallel(&mut self, ops: &[Operation]) {
        self.flush(ops);
    }

    fn prefix_sum(&self, index: usize) -> Value {
        self.tree.sum(index)
    }
}

impl BatchExecutor for LazyExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        drain_batch(self, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(index: usize, value: Value) -> Operation {
        Operation::Add { index, value }
    }

    #[test]
    fn test_queries_observe_sequential_order() {
        let mut exec = LazyExecutor::new(8, 2).unwrap();
        let results = exec.execute(&[
            update(0, 1),
            update(3, 2),
            Operation::Query { index: 7 },
            update(5, 4),
            Operation::Query { index: 7 },
        ]);

        assert_eq!((results[0].position, results[0].value), (2, 3));
        assert_eq!((results[1].position, results[1].value), (4, 7));
    }

    #[test]
    fn test_trailing_window_flushed() {
        let mut exec = LazyExecutor::new(64, 4).unwrap();
        exec.execute(&[update(1, 5), update(2, 6)]);

        let results = exec.execute(&[Operation::Query { index: 63 }]);
        assert_eq!(results[0].value, 11);
    }

    #[test]
    fn test_window_larger_than_workers() {
        let mut exec = LazyExecutor::new(1 << 12, 3).unwrap();
        let mut batch: Vec<Operation> = (0..5000)
            .map(|i| update(i % (1 << 12), 1))
            .collect();
        batch.push(Operation::Query { index: (1 << 12) - 1 });

        let results = exec.execute(&batch);
        assert_eq!(results[0].value, 5000);
    }
}
