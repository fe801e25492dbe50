/*!
 * Batch Executors
 * Strategy drivers for bulk application of mixed update/query workloads
 */

mod aggregate;
mod lazy;
mod locked;
mod pipeline;
mod semi_static;
mod sequential;

pub use aggregate::AggregateExecutor;
pub use lazy::LazyExecutor;
pub use locked::LockedExecutor;
pub use pipeline::PipelineExecutor;
pub use semi_static::SemiStaticExecutor;
pub use sequential::SequentialExecutor;

use crate::core::errors::{ConfigError, StrategyError};
use crate::core::traits::BatchExecutor;
use crate::core::types::{Operation, QueryResult, Value};
use crate::scheduler::{CentralScheduler, DecentralizedExecutor, LockFreeScheduler};
use std::fmt;
use std::str::FromStr;

/// Bulk-apply capability shared by the striped pipeline family
///
/// `apply_parallel` fans an update-only run out across the workers;
/// `prefix_sum` answers a query against the quiesced tree between runs.
pub(crate) trait StripedApply {
    fn apply_parallel(&mut self, ops: &[Operation]);
    fn prefix_sum(&self, index: usize) -> Value;
}

/// Consume a mixed batch as runs of updates delimited by queries
///
/// Each run is flushed through the executor's parallel apply, then the
/// query is answered on the quiesced tree. Every query therefore observes
/// exactly the updates that precede it in the batch.
pub(crate) fn drain_batch<E: StripedApply>(
    exec: &mut E,
    batch: &[Operation],
) -> Vec<QueryResult> {
    let mut results = Vec::new();
    let mut left = 0;
    for (pos, op) in batch.iter().enumerate() {
        if let Operation::Query { index } = *op {
            exec.apply_parallel(&batch[left..pos]);
            results.push(QueryResult {
                position: pos,
                value: exec.prefix_sum(index),
            });
            left = pos + 1;
        }
    }
    exec.apply_parallel(&batch[left..]);
    results
}

/// Execution strategy selector
///
/// One tag per batch executor; `build` is the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Lock,
    Pipeline,
    PipelineSemiStatic,
    PipelineAggregate,
    Lazy,
    CentralScheduler,
    LockfreeScheduler,
    PureParallel,
}

impl Strategy {
    pub const ALL: [Strategy; 9] = [
        Strategy::Sequential,
        Strategy::Lock,
        Strategy::Pipeline,
        Strategy::PipelineSemiStatic,
        Strategy::PipelineAggregate,
        Strategy::Lazy,
        Strategy::CentralScheduler,
        Strategy::LockfreeScheduler,
        Strategy::PureParallel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Lock => "lock",
            Strategy::Pipeline => "pipeline",
            Strategy::PipelineSemiStatic => "pipeline-semi-static",
            Strategy::PipelineAggregate => "pipeline-aggregate",
            Strategy::Lazy => "lazy",
            Strategy::CentralScheduler => "central_scheduler",
            Strategy::LockfreeScheduler => "lockfree_scheduler",
            Strategy::PureParallel => "pure_parallel",
        }
    }

    /// Whether query results match the sequential executor exactly
    ///
    /// The striped-lock path answers queries concurrently with updates and
    /// only promises the relaxed contract of its tree; everything else
    /// observes sequential batch order.
    pub fn exact_queries(self) -> bool {
        !matches!(self, Strategy::Lock)
    }

    /// Construct the executor for this strategy
    pub fn build(
        self,
        n: usize,
        workers: usize,
        batch_size: usize,
    ) -> Result<Box<dyn BatchExecutor>, ConfigError> {
        Ok(match self {
            Strategy::Sequential => Box::new(SequentialExecutor::new(n)?),
            Strategy::Lock => Box::new(LockedExecutor::new(n, workers)?),
            Strategy::Pipeline => Box::new(PipelineExecutor::new(n, workers)?),
            Strategy::PipelineSemiStatic => Box::new(SemiStaticExecutor::new(n, workers)?),
            Strategy::PipelineAggregate => Box::new(AggregateExecutor::new(n, workers)?),
            Strategy::Lazy => Box::new(LazyExecutor::new(n, workers)?),
            Strategy::CentralScheduler => {
                Box::new(CentralScheduler::new(n, workers, batch_size)?)
            }
            Strategy::LockfreeScheduler => {
                Box::new(LockFreeScheduler::new(n, workers, batch_size)?)
            }
            Strategy::PureParallel => {
                Box::new(DecentralizedExecutor::new(n, workers, batch_size)?)
            }
        })
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| StrategyError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
