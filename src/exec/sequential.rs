/*!
 * Sequential Executor
 * Reference driver: one thread, batch order is execution order
 */

use crate::core::errors::ConfigError;
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult};
use crate::tree::FenwickTree;

/// Single-threaded batch executor over a plain Fenwick tree
///
/// Every other executor's query semantics are defined relative to this
/// one: a query observes exactly the updates that precede it in the batch.
pub struct SequentialExecutor {
    tree: FenwickTree,
}

impl SequentialExecutor {
    pub fn new(n: usize) -> ConfigResult<Self> {
        if n == 0 {
            return Err(ConfigError::ZeroDomain);
        }
        Ok(Self {
            tree: FenwickTree::new(n),
        })
    }
}

impl BatchExecutor for SequentialExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        let mut results = Vec::new();
        for (pos, op) in batch.iter().enumerate() {
            match *op {
                Operation::Add { index, value } => self.tree.add(index, value),
                Operation::Query { index } => results.push(QueryResult {
                    position: pos,
                    value: self.tree.sum(index),
                }),
            }
        }
        results
    }
}
