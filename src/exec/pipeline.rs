/*!
 * Pipeline Executor
 * Range-partitioned shared tree: every worker scans the whole batch and
 * writes only its own stripe
 */

use super::{drain_batch, StripedApply};
use crate::core::errors::check_dimensions;
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult, Value};
use crate::partition::{partition, split_ranges, WorkerRange};
use crate::tree::{jump_into, lowbit};
use log::info;
use std::thread;

/// Shared Fenwick tree with one disjoint index stripe per worker
///
/// A batch of updates is applied by every worker in parallel: each worker
/// walks each update's ancestor chain but only touches the cells that fall
/// inside its own stripe. Stripes are contiguous and disjoint, so the
/// workers hold non-overlapping mutable slices of the tree and no locking
/// is needed. Queries quiesce the tree first; see `execute`.
pub struct PipelineExecutor {
    pub(crate) bits: Vec<Value>,
    pub(crate) ranges: Vec<WorkerRange>,
}

impl PipelineExecutor {
    pub fn new(n: usize, workers: usize) -> ConfigResult<Self> {
        check_dimensions(n, workers)?;
        let ranges = partition(n, workers);
        info!(
            "pipeline executor over [0, {}) with {} worker stripes",
            n, workers
        );
        Ok(Self {
            bits: vec![0; n + 1],
            ranges,
        })
    }

    /// Apply every update in `ops` across all worker stripes in parallel
    pub fn batch_add(&mut self, ops: &[Operation]) {
        if ops.is_empty() {
            return;
        }
        let ranges = &self.ranges;
        let stripes = split_ranges(&mut self.bits, ranges);
        thread::scope(|scope| {
            for (range, stripe) in ranges.iter().zip(stripes) {
                scope.spawn(move || apply_stripe(*range, stripe, ops));
            }
        });
    }

    /// Prefix sum over `[0, index]` on the quiesced tree
    pub fn sum(&self, index: usize) -> Value {
        debug_assert!(index + 1 < self.bits.len(), "index {} out of range", index);
        let mut total = 0;
        let mut k = index + 1;
        while k > 0 {
            total += self.bits[k];
            k -= lowbit(k);
        }
        total
    }

    /// Current worker stripes
    pub fn ranges(&self) -> &[WorkerRange] {
        &self.ranges
    }

    /// The `top` heaviest tree cells, descending by value
    pub fn hot_cells(&self, top: usize) -> Vec<(usize, Value)> {
        let mut cells: Vec<(Value, usize)> = self
            .bits
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &v)| (v, k))
            .collect();
        cells.sort_unstable_by(|a, b| b.cmp(a));
        cells.truncate(top);
        cells.into_iter().map(|(v, k)| (k, v)).collect()
    }

    /// Mean cell value across the tree
    pub fn cell_mean(&self) -> f64 {
        let total: i64 = self.bits.iter().skip(1).map(|&v| v as i64).sum();
        total as f64 / (self.bits.len() - 1) as f64
    }
}

/// Walk one worker's share of every update in `ops`
///
/// The entry point of each walk is jumped directly to the first ancestor
/// inside the stripe instead of stepping through the indices below `lo`.
fn apply_stripe(range: WorkerRange, stripe: &mut [Value], ops: &[Operation]) {
    if range.is_empty() {
        return;
    }
    for op in ops {
        if let Operation::Add { index, value } = *op {
            let mut k = jump_into(index + 1, range.lo);
            while k < range.hi {
                stripe[k - range.lo] += value;
                k += lowbit(k);
            }
        }
    }
}

impl StripedApply for PipelineExecutor {
    fn apply_parallel(&mut self, ops: &[Operation]) {
        self.batch_add(ops);
    }

    fn prefix_sum(&self, index: usize) -> Value {
        self.sum(index)
    }
}

impl BatchExecutor for PipelineExecutor {
    /// Queries are not fanned out: the batch is consumed as runs of
    /// updates delimited by queries, each run applied in parallel and each
    /// query answered on the quiesced tree in between.
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        drain_batch(self, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FenwickTree;

    fn update(index: usize, value: Value) -> Operation {
        Operation::Add { index, value }
    }

    #[test]
    fn test_batch_add_matches_sequential() {
        let n = 1 << 10;
        let mut pipeline = PipelineExecutor::new(n, 4).unwrap();
        let mut reference = FenwickTree::new(n);

        let ops: Vec<Operation> = (0..2000)
            .map(|i| update((i * 37) % n, ((i % 13) + 1) as Value))
            .collect();

        pipeline.batch_add(&ops);
        reference.batch_add(&ops);

        for i in [0usize, 1, 63, 64, 511, n - 1] {
            assert_eq!(pipeline.sum(i), reference.sum(i), "prefix {}", i);
        }
    }

    #[test]
    fn test_every_cell_written_once_per_chain() {
        // Two workers, every cell of the ancestor chain of index 0 must be
        // incremented exactly once in total across stripes.
        let n = 64;
        let mut pipeline = PipelineExecutor::new(n, 2).unwrap();
        pipeline.batch_add(&[update(0, 1)]);

        let expected_chain = [1usize, 2, 4, 8, 16, 32, 64];
        for k in 1..=n {
            let expected = if expected_chain.contains(&k) { 1 } else { 0 };
            assert_eq!(pipeline.bits[k], expected, "cell {}", k);
        }
    }

    #[test]
    fn test_execute_serves_queries_in_order() {
        let mut pipeline = PipelineExecutor::new(8, 2).unwrap();
        let results = pipeline.execute(&[
            update(0, 1),
            update(3, 2),
            Operation::Query { index: 7 },
            update(5, 4),
            Operation::Query { index: 7 },
        ]);

        assert_eq!(results.len(), 2);
        assert_eq!((results[0].position, results[0].value), (2, 3));
        assert_eq!((results[1].position, results[1].value), (4, 7));
    }

    #[test]
    fn test_hot_cells_ranked() {
        let mut pipeline = PipelineExecutor::new(16, 2).unwrap();
        pipeline.batch_add(&[update(0, 5), update(0, 5)]);

        let hot = pipeline.hot_cells(3);
        assert_eq!(hot[0].1, 10);
        assert!(hot[0].1 >= hot[1].1 && hot[1].1 >= hot[2].1);
    }
}
