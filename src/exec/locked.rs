/*!
 * Striped-Lock Executor
 * Unrestricted interleaved path: every op runs concurrently on one tree
 */

use crate::core::errors::check_dimensions;
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult};
use crate::tree::StripedFenwick;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

/// Batch executor that splits the batch into chunks and runs them all at
/// once against a block-striped tree
///
/// Updates serialize per lock block; queries run with no synchronization
/// at all. A query's value reflects some serialization of the updates
/// completed before it plus a subset of in-flight ones; callers wanting
/// sequential query semantics should pick a different strategy.
pub struct LockedExecutor {
    tree: StripedFenwick,
    workers: usize,
}

impl LockedExecutor {
    pub fn new(n: usize, workers: usize) -> ConfigResult<Self> {
        check_dimensions(n, workers)?;
        Ok(Self {
            tree: StripedFenwick::new(n),
            workers,
        })
    }
}

impl BatchExecutor for LockedExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        if batch.is_empty() {
            return Vec::new();
        }

        let results: Vec<AtomicI32> = (0..batch.len()).map(|_| AtomicI32::new(0)).collect();
        let per_worker = (batch.len() + self.workers - 1) / self.workers;
        let tree = &self.tree;
        let results_ref = &results;

        thread::scope(|scope| {
            for (chunk_id, chunk) in batch.chunks(per_worker).enumerate() {
                let base = chunk_id * per_worker;
                scope.spawn(move || {
                    for (i, op) in chunk.iter().enumerate() {
                        match *op {
                            Operation::Add { index, value } => tree.add(index, value),
                            Operation::Query { index } => {
                                results_ref[base + i].store(tree.sum(index), Ordering::Relaxed);
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
                value: results[pos].load(Ordering::Relaxed),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_all_applied() {
        let mut exec = LockedExecutor::new(1 << 12, 4).unwrap();
        let batch: Vec<Operation> = (0..4096)
            .map(|i| Operation::Add {
                index: i % (1 << 12),
                value: 1,
            })
            .collect();
        exec.execute(&batch);

        let results = exec.execute(&[Operation::Query { index: (1 << 12) - 1 }]);
        assert_eq!(results[0].value, 4096);
    }

    #[test]
    fn test_quiet_queries_are_exact() {
        let mut exec = LockedExecutor::new(64, 4).unwrap();
        exec.execute(&[
            Operation::Add { index: 0, value: 3 },
            Operation::Add { index: 9, value: 4 },
        ]);

        // No updates in flight: queries see the settled tree.
        let results = exec.execute(&[
            Operation::Query { index: 5 },
            Operation::Query { index: 63 },
        ]);
        assert_eq!(results[0].value, 3);
        assert_eq!(results[1].value, 7);
    }
}
