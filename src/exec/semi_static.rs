/*!
 * Semi-Static Pipeline Executor
 * Pipeline tree whose stripe boundaries drift by a small step each batch
 */

use super::pipeline::PipelineExecutor;
use super::{drain_batch, StripedApply};
use crate::core::traits::BatchExecutor;
use crate::core::types::{ConfigResult, Operation, QueryResult, Value};
use crate::partition::WorkerRange;
use log::debug;

/// Default boundary shift per batch; odd so the parity rule alternates
const DEFAULT_STEP: usize = 127;

/// Pipeline executor with a per-batch boundary-rebalance heuristic
///
/// After each batch exactly one boundary moves by `step` indices. The
/// first worker can only grow rightward, the last only leftward; interior
/// workers alternate direction on the parity of their `lo + hi`. The
/// heuristic carries no convergence guarantee; it is a cheap feedback
/// nudge, nothing more.
pub struct SemiStaticExecutor {
    inner: PipelineExecutor,
    step: usize,
    batches: usize,
}

impl SemiStaticExecutor {
    pub fn new(n: usize, workers: usize) -> ConfigResult<Self> {
        Self::with_step(n, workers, DEFAULT_STEP)
    }

    /// Create with a custom rebalance step; `step` must be odd
    pub fn with_step(n: usize, workers: usize, step: usize) -> ConfigResult<Self> {
        assert!(step % 2 == 1, "rebalance step must be odd");
        Ok(Self {
            inner: PipelineExecutor::new(n, workers)?,
            step,
            batches: 0,
        })
    }

    /// Current worker stripes
    pub fn ranges(&self) -> &[WorkerRange] {
        self.inner.ranges()
    }

    /// Prefix sum over `[0, index]` on the quiesced tree
    pub fn sum(&self, index: usize) -> Value {
        self.inner.sum(index)
    }

    /// Shift one boundary by `step`, keeping every stripe non-empty
    fn rebalance(&mut self) {
        let workers = self.inner.ranges.len();
        if workers < 2 {
            return;
        }

        let designated = self.batches % workers;
        // Boundary b sits between worker b and worker b + 1.
        let boundary = designated.min(workers - 2);
        let grow = if designated == 0 {
            true
        } else if designated == workers - 1 {
            false
        } else {
            let range = self.inner.ranges[designated];
            (range.lo + range.hi) % 2 == 1
        };

        let left = self.inner.ranges[boundary];
        let right = self.inner.ranges[boundary + 1];
        let hi = if grow {
            left.hi.saturating_add(self.step)
        } else {
            left.hi.saturating_sub(self.step)
        };
        // Both neighbours must keep at least one index.
        let min_hi = left.lo + 1;
        let max_hi = right.hi.saturating_sub(1);
        if min_hi > max_hi {
            return;
        }
        let hi = hi.clamp(min_hi, max_hi);

        self.inner.ranges[boundary].hi = hi;
        self.inner.ranges[boundary + 1].lo = hi;
        debug!(
            "batch {}: boundary {} moved to {} ({})",
            self.batches,
            boundary,
            hi,
            if grow { "right" } else { "left" }
        );
    }
}

impl StripedApply for SemiStaticExecutor {
    fn apply_parallel(&mut self, ops: &[Operation]) {
        self.inner.batch_add(ops);
    }

    fn prefix_sum(&self, index: usize) -> Value {
        self.inner.sum(index)
    }
}

impl BatchExecutor for SemiStaticExecutor {
    fn execute(&mut self, batch: &[Operation]) -> Vec<QueryResult> {
        let results = drain_batch(self, batch);
        self.rebalance();
        self.batches += 1;
        results
    }
}
