/*!
 * Core Traits
 * Capability seams: point trees and batch executors
 */

use super::types::{Operation, QueryResult, Value};

/// Point-update / prefix-query capability for single-writer trees
pub trait PrefixSum {
    /// Increment the logical array at `index` by `value`
    fn add(&mut self, index: usize, value: Value);

    /// Prefix sum over `[0, index]`
    fn sum(&self, index: usize) -> Value;

    /// Size of the logical domain
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point-update / prefix-query capability for trees that synchronize
/// internally and accept updates through a shared reference
pub trait SharedPrefixSum: Send + Sync {
    fn add(&self, index: usize, value: Value);

    fn sum(&self, index: usize) -> Value;

    fn len(&self) -> usize;
}

/// Batched execution contract
///
/// `execute` consumes one ordered batch of operations and blocks until every
/// query in the batch has its value. Results are sparse: one entry per query,
/// positionally tagged, in batch order. See each implementation for its
/// query-ordering contract.
pub trait BatchExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult>;
}
