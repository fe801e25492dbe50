/*!
 * Decentralized Executor
 * Queue-free scheduling: every worker scans the batch and claims a
 * deterministic slice of the updates
 */

use crate::core::errors::{check_dimensions, ConfigError};
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult};
use crate::tree::FenwickTree;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

/// Batch executor without queues or a dispatching driver
///
/// All workers iterate the same batch vector. Each counts updates as it
/// goes and applies only those whose ordinal is congruent to its own id
/// modulo the worker count; every worker reproduces the same distribution
/// independently, so no coordination is needed. Queries are answered by
/// every worker with its sub-tree's partial, aggregated by atomic add.
/// The per-batch join is the sync point.
pub struct DecentralizedExecutor {
    trees: Vec<FenwickTree>,
    results: Vec<AtomicI32>,
    batch_size: usize,
}

impl DecentralizedExecutor {
    pub fn new(n: usize, workers: usize, batch_size: usize) -> ConfigResult<Self> {
        check_dimensions(n, workers)?;
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self {
            trees: (0..workers).map(|_| FenwickTree::new(n)).collect(),
            results: (0..batch_size).map(|_| AtomicI32::new(0)).collect(),
            batch_size,
        })
    }
}

impl BatchExecutor for DecentralizedExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        assert!(
            batch.len() <= self.batch_size,
            "batch of {} exceeds configured batch size {}",
            batch.len(),
            self.batch_size
        );

        for slot in &self.results[..batch.len()] {
            slot.store(0, Ordering::Relaxed);
        }

        let workers = self.trees.len();
        let results = &self.results;
        thread::scope(|scope| {
            for (worker, tree) in self.trees.iter_mut().enumerate() {
                scope.spawn(move || {
                    let mut updates_seen = 0usize;
                    for (pos, op) in batch.iter().enumerate() {
                        match *op {
                            Operation::Add { index, value } => {
                                if updates_seen % workers == worker {
                                    tree.add(index, value);
                                }
                                updates_seen += 1;
                            }
                            Operation::Query { index } => {
                                results[pos].fetch_add(tree.sum(index), Ordering::Relaxed);
                            }
                        }
                    }
                });
            }
        });

        batch
            .iter()
            .enumerate()
            .filter(|(_, op)| op.is_query())
            .map(|(pos, _)| QueryResult {
                position: pos,
                value: self.results[pos].load(Ordering::Relaxed),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Value;

    fn update(index: usize, value: Value) -> Operation {
        Operation::Add { index, value }
    }

    #[test]
    fn test_interleaved_batch() {
        let mut exec = DecentralizedExecutor::new(8, 3, 8).unwrap();
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
    fn test_slices_cover_all_updates() {
        let n = 1 << 10;
        let mut exec = DecentralizedExecutor::new(n, 4, 2048).unwrap();
        let batch: Vec<Operation> = (0..2000).map(|i| update(i % n, 1)).collect();
        exec.execute(&batch);

        let results = exec.execute(&[Operation::Query { index: n - 1 }]);
        assert_eq!(results[0].value, 2000);
    }

    #[test]
    fn test_trees_persist_across_batches() {
        let mut exec = DecentralizedExecutor::new(16, 2, 8).unwrap();
        exec.execute(&[update(4, 9)]);
        let results = exec.execute(&[Operation::Query { index: 15 }]);
        assert_eq!(results[0].value, 9);
    }
}
